//! Cross-origin resource sharing
//!
//! Allow-all policy: any origin, the GET/POST/HEAD methods and the
//! usual simple request headers. Preflight requests are answered here and
//! never reach the method dispatcher.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};

const ALLOW_METHODS: &str = "GET, POST, HEAD";
const ALLOW_HEADERS: &str = "Origin, Accept, Content-Type, X-Requested-With";

/// An `OPTIONS` request announcing the method it wants to use
pub fn is_preflight<B>(req: &Request<B>) -> bool {
    req.method() == Method::OPTIONS && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// Build the 204 answer to a preflight request
pub fn build_preflight_response(request_headers: &HeaderMap) -> Response<Full<Bytes>> {
    let allow_headers = request_headers
        .get(ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(ALLOW_HEADERS));

    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .header("Access-Control-Allow-Headers", allow_headers)
        .header(
            "Vary",
            "Origin, Access-Control-Request-Method, Access-Control-Request-Headers",
        )
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            crate::logger::log_error(&format!("Failed to build preflight response: {e}"));
            Response::new(Full::new(Bytes::new()))
        })
}

/// Add the allow-all headers to an ordinary response
pub fn apply_headers(response: &mut Response<Full<Bytes>>) {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.append("Vary", HeaderValue::from_static("Origin"));
}
