//! HTTP response building module
//!
//! Provides builders for the status codes the server produces, decoupled from
//! the upload and static file logic that picks them.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// Build a plain-text response with the given status
pub fn build_text_response(status: StatusCode, text: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let body = text.into();
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", body.len())
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(body))
        })
}

/// Build 200 response carrying an upload acknowledgement token
///
/// No Content-Type is set; the body is a bare base64 string.
pub fn build_token_response(token: String) -> Response<Full<Bytes>> {
    let body = Bytes::from(token);
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Length", body.len())
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(body))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, last_modified: Option<&str>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag);
    if let Some(date) = last_modified {
        builder = builder.header("Last-Modified", date);
    }
    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::NOT_FOUND, "404 page not found")
}

/// Build 405 response for methods other than GET and POST
pub fn build_405_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::METHOD_NOT_ALLOWED, "not supported")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "payload too large")
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<Full<Bytes>> {
    let mut response =
        build_text_response(StatusCode::RANGE_NOT_SATISFIABLE, "invalid range");
    if let Ok(value) = format!("bytes */{file_size}").parse() {
        response.headers_mut().insert("Content-Range", value);
    }
    response
}

/// Build 301 redirect response
///
/// Used to add the trailing slash to directory URLs so relative links in
/// the listing resolve inside the directory.
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("Location", target)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 HTML response
pub fn build_html_response(content: String) -> Response<Full<Bytes>> {
    let body = Bytes::from(content);
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", body.len())
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(body))
        })
}

/// Validator headers attached to file responses
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub last_modified: Option<&'a str>,
}

/// Build 200 (full) or 206 (partial) file response
///
/// `range` is the inclusive byte span already sliced out of `data`.
pub fn build_file_response(
    data: Bytes,
    headers: &FileHeaders<'_>,
    range: Option<(u64, u64, u64)>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .header("Content-Type", headers.content_type)
        .header("Content-Length", data.len())
        .header("Accept-Ranges", "bytes")
        .header("ETag", headers.etag);

    if let Some(date) = headers.last_modified {
        builder = builder.header("Last-Modified", date);
    }

    builder = match range {
        Some((start, end, total)) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header("Content-Range", format!("bytes {start}-{end}/{total}")),
        None => builder.status(StatusCode::OK),
    };

    builder.body(Full::new(data)).unwrap_or_else(|e| {
        log_build_error("file", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
