//! Upload gate
//!
//! POST pipeline: buffer the multipart form, decode the request token,
//! write the parts whose names the token declares, and answer with a
//! response token listing what was stored.

mod form;
mod store;

pub use form::{read_form, FilePart, MultipartForm};
pub use store::{store_parts, PartOutcome, PartStatus, UploadReport};

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_LENGTH;
use hyper::{Request, Response, StatusCode};
use std::path::Path;
use thiserror::Error;
use url::form_urlencoded;

use crate::config::AppState;
use crate::http;
use crate::logger;
use crate::token::{self, ResponseToken, TokenError};

#[derive(Debug, Error)]
pub enum UploadError {
    /// Body could not be read as a multipart form
    #[error("{0}")]
    Multipart(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("json error")]
    Token(#[from] TokenError),
}

impl UploadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Multipart(_) | Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text sent to the client
    ///
    /// Token failures all collapse into `json error`; the detailed cause
    /// only goes to the log.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Self::PayloadTooLarge { .. } => http::build_413_response(),
            Self::Multipart(message) => {
                http::build_text_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            Self::Token(_) => {
                http::build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "json error")
            }
        }
    }
}

/// Successful upload: the encoded token plus what happened to each part
#[derive(Debug)]
pub struct UploadAck {
    pub token: String,
    pub report: UploadReport,
}

/// Handle a POST request
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match process_upload(req, &state.root, state.config.http.max_body_size).await {
        Ok(ack) => {
            logger::log_upload_report(&ack.report);
            http::build_token_response(ack.token)
        }
        Err(e) => {
            match &e {
                UploadError::Token(cause) => logger::log_warning(&format!("Rejected token: {cause}")),
                other => logger::log_warning(&format!("Rejected upload: {other}")),
            }
            e.into_response()
        }
    }
}

/// Run the upload pipeline against `root`
pub async fn process_upload<B>(
    req: Request<B>,
    root: &Path,
    max_body_size: u64,
) -> Result<UploadAck, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if declared_length(&req).is_some_and(|len| len > max_body_size) {
        return Err(UploadError::PayloadTooLarge {
            limit: max_body_size,
        });
    }

    let (parts, body) = req.into_parts();
    let form = read_form(&parts.headers, body, max_body_size).await?;

    // The query string is consulted before the form body
    let raw_token = query_token(parts.uri.query())
        .or_else(|| form.value("token").map(ToString::to_string))
        .unwrap_or_default();
    let request = token::decode_request(&raw_token)?;

    let report = store_parts(root, form.files(), &request.image_uuids).await;

    let response = ResponseToken {
        uploaded_images: report.uploaded(),
        uuid: request.uuid,
        request_images: request.image_uuids,
    };
    let token = token::encode_response(&response)?;

    Ok(UploadAck { token, report })
}

/// Content-Length as sent by the client, if it parses
fn declared_length<B>(req: &Request<B>) -> Option<u64> {
    req.headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// `token` from the query string, form-urlencoded
fn query_token(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    const BOUNDARY: &str = "----hsns-test-boundary";

    enum FormPart<'a> {
        Field(&'a str, &'a str),
        File(&'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                FormPart::Field(name, value) => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                FormPart::File(name, content) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"blob\"\r\n\
                             Content-Type: image/png\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(content);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        out
    }

    fn post(uri: &str, parts: &[FormPart<'_>]) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Full::new(Bytes::from(multipart_body(parts))))
            .unwrap()
    }

    fn token(value: &Value) -> String {
        STANDARD.encode(value.to_string())
    }

    fn decode_ack(token: &str) -> Value {
        serde_json::from_slice(&STANDARD.decode(token).unwrap()).unwrap()
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_declared_subset_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let t = token(&json!({"uuid": "r1", "imageUuids": ["a.png", "b.png"]}));
        let req = post(
            "/",
            &[
                FormPart::Field("token", &t),
                FormPart::File("a.png", b"X"),
                FormPart::File("c.png", b"Y"),
            ],
        );

        let ack = process_upload(req, dir.path(), 1 << 20).await.unwrap();

        assert_eq!(
            decode_ack(&ack.token),
            json!({"uuid": "r1", "requestImages": ["a.png", "b.png"], "uploadedImages": ["a.png"]})
        );
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"X");
        assert!(!dir.path().join("b.png").exists());
        assert!(!dir.path().join("c.png").exists());
        assert_eq!(ack.report.missing, ["b.png"]);
    }

    #[tokio::test]
    async fn test_token_after_files() {
        let dir = tempfile::tempdir().unwrap();
        let t = token(&json!({"uuid": 7, "imageUuids": ["one", "two"]}));
        let req = post(
            "/upload",
            &[
                FormPart::File("two", b"2"),
                FormPart::File("one", b"1"),
                FormPart::Field("token", &t),
            ],
        );

        let ack = process_upload(req, dir.path(), 1 << 20).await.unwrap();
        let decoded = decode_ack(&ack.token);

        assert_eq!(decoded["uuid"], json!(7));
        assert_eq!(decoded["uploadedImages"], json!(["two", "one"]));
    }

    #[tokio::test]
    async fn test_uuid_is_echoed_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        for uuid in [json!(null), json!({"batch": [1, 2]}), json!(3.5), json!("s")] {
            let t = token(&json!({"uuid": uuid, "imageUuids": []}));
            let req = post("/", &[FormPart::Field("token", &t)]);
            let ack = process_upload(req, dir.path(), 1 << 20).await.unwrap();
            assert_eq!(decode_ack(&ack.token)["uuid"], uuid);
        }
    }

    #[tokio::test]
    async fn test_token_from_query_string() {
        let dir = tempfile::tempdir().unwrap();
        let t = token(&json!({"uuid": "q", "imageUuids": ["a.png"]}));
        let uri = format!("/?token={}", urlencoding::encode(&t));
        let req = post(&uri, &[FormPart::File("a.png", b"Q")]);

        let ack = process_upload(req, dir.path(), 1 << 20).await.unwrap();

        assert_eq!(decode_ack(&ack.token)["uploadedImages"], json!(["a.png"]));
    }

    #[tokio::test]
    async fn test_query_token_wins_over_form_field() {
        let dir = tempfile::tempdir().unwrap();
        let from_query = token(&json!({"uuid": "query", "imageUuids": ["a.png"]}));
        let from_form = token(&json!({"uuid": "form", "imageUuids": []}));
        let uri = format!("/?token={}", urlencoding::encode(&from_query));
        let req = post(
            &uri,
            &[FormPart::Field("token", &from_form), FormPart::File("a.png", b"Q")],
        );

        let ack = process_upload(req, dir.path(), 1 << 20).await.unwrap();

        let ack = decode_ack(&ack.token);
        assert_eq!(ack["uuid"], "query");
        assert_eq!(ack["uploadedImages"], json!(["a.png"]));
    }

    #[tokio::test]
    async fn test_repeat_upload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let t = token(&json!({"uuid": "r", "imageUuids": ["a.png"]}));
        let parts = [FormPart::Field("token", &t), FormPart::File("a.png", b"same")];

        let first = process_upload(post("/", &parts), dir.path(), 1 << 20).await.unwrap();
        let second = process_upload(post("/", &parts), dir.path(), 1 << 20).await.unwrap();

        assert_eq!(first.token, second.token);
        assert_eq!(std::fs::read(dir.path().join("a.png")).unwrap(), b"same");
    }

    #[tokio::test]
    async fn test_bad_tokens_are_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        let bad = [
            "%%%".to_string(),
            STANDARD.encode("not json"),
            token(&json!({"uuid": "r"})),
            token(&json!({"uuid": "r", "imageUuids": [1, 2]})),
        ];
        for t in bad {
            let req = post("/", &[FormPart::Field("token", &t), FormPart::File("a", b"x")]);
            let err = process_upload(req, dir.path(), 1 << 20).await.unwrap_err();
            assert!(matches!(err, UploadError::Token(_)));
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_text(response).await, "json error");
        }
        assert!(!dir.path().join("a").exists());
    }

    #[tokio::test]
    async fn test_missing_token_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let req = post("/", &[FormPart::File("a.png", b"x")]);
        let err = process_upload(req, dir.path(), 1 << 20).await.unwrap_err();
        assert!(matches!(err, UploadError::Token(TokenError::Json(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_returns_parser_message() {
        let dir = tempfile::tempdir().unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("Content-Type", "text/plain")
            .body(Full::new(Bytes::from_static(b"hello")))
            .unwrap();

        let err = process_upload(req, dir.path(), 1 << 20).await.unwrap_err();
        let expected = err.to_string();
        assert!(!expected.is_empty());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, expected);
    }

    #[tokio::test]
    async fn test_declared_content_length_over_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = post("/", &[FormPart::File("a.png", b"x")]);
        req.headers_mut()
            .insert(CONTENT_LENGTH, "999999".parse().unwrap());

        let err = process_upload(req, dir.path(), 1024).await.unwrap_err();
        assert!(matches!(err, UploadError::PayloadTooLarge { limit: 1024 }));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_query_token() {
        assert_eq!(query_token(Some("a=1&token=YWJj")), Some("YWJj".to_string()));
        assert_eq!(query_token(Some("token=a%2Bb%3D")), Some("a+b=".to_string()));
        assert_eq!(query_token(Some("token=a+b")), Some("a b".to_string()));
        assert_eq!(query_token(Some("token=first&token=second")), Some("first".to_string()));
        assert_eq!(query_token(Some("token")), Some(String::new()));
        assert_eq!(query_token(Some("other=1")), None);
        assert_eq!(query_token(None), None);
    }
}
