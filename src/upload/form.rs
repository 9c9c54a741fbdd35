//! Multipart form collection
//!
//! The whole form is buffered before any part is written: the token that
//! decides which parts to keep may arrive after the file parts. The buffered
//! size is capped by `http.max_body_size`.

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::CONTENT_TYPE;
use hyper::HeaderMap;
use multer::{Constraints, Multipart, SizeLimit};

use super::UploadError;

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name, used as the target file name
    pub name: String,
    pub content: Bytes,
}

/// Fully buffered multipart form, in arrival order
#[derive(Debug, Default)]
pub struct MultipartForm {
    values: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartForm {
    /// First plain value submitted under `name`
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// File parts, one per field name, in the order they were received
    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    fn push_file(&mut self, name: String, content: Bytes) {
        // Only the first part under a given name counts
        if self.files.iter().any(|f| f.name == name) {
            return;
        }
        self.files.push(FilePart { name, content });
    }
}

/// Read and buffer a `multipart/form-data` body
pub async fn read_form<B>(
    headers: &HeaderMap,
    body: B,
    max_body_size: u64,
) -> Result<MultipartForm, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            UploadError::Multipart("request Content-Type isn't multipart/form-data".to_string())
        })?;
    let boundary =
        multer::parse_boundary(content_type).map_err(|e| UploadError::Multipart(e.to_string()))?;

    let constraints =
        Constraints::new().size_limit(SizeLimit::new().whole_stream(max_body_size));
    let mut multipart =
        Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut form = MultipartForm::default();
    while let Some(field) = multipart.next_field().await.map_err(map_multer_error)? {
        let Some(name) = field.name().map(ToString::to_string) else {
            // Nameless parts carry nothing addressable; drain and move on
            field.bytes().await.map_err(map_multer_error)?;
            continue;
        };

        let is_file = field.file_name().is_some_and(|f| !f.is_empty());
        if is_file {
            let content = field.bytes().await.map_err(map_multer_error)?;
            form.push_file(name, content);
        } else {
            let value = field.text().await.map_err(map_multer_error)?;
            form.values.push((name, value));
        }
    }

    Ok(form)
}

fn map_multer_error(err: multer::Error) -> UploadError {
    match err {
        multer::Error::StreamSizeExceeded { limit } => UploadError::PayloadTooLarge { limit },
        other => UploadError::Multipart(other.to_string()),
    }
}
