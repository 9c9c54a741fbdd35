//! Static file serving module
//!
//! GET side of the root directory: resolves the request path inside the root,
//! then answers with the file, a 304, a byte range or a 404. Directories
//! serve their `index.html` when present and a plain HTML listing otherwise.

use crate::http::{self, cache::Validators, mime, response::FileHeaders, RangeSpec};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, RANGE};
use hyper::http::request::Parts;
use hyper::Response;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

const INDEX_FILE: &str = "index.html";

/// Serve a GET request from `root`
pub async fn serve(req: &Parts, root: &Path) -> Response<Full<Bytes>> {
    let Some(file_path) = resolve_path(root, req.uri.path()).await else {
        return http::build_404_response();
    };

    let meta = match fs::metadata(&file_path).await {
        Ok(m) => m,
        Err(e) => {
            logger::log_warning(&format!("Failed to stat '{}': {e}", file_path.display()));
            return http::build_404_response();
        }
    };

    if !meta.is_dir() {
        return serve_file(req, &file_path, &meta).await;
    }

    // Relative links in the listing need the trailing slash
    if !req.uri.path().ends_with('/') {
        let target = match req.uri.query() {
            Some(query) => format!("{}/?{query}", req.uri.path()),
            None => format!("{}/", req.uri.path()),
        };
        return http::build_redirect_response(&target);
    }

    let index_path = file_path.join(INDEX_FILE);
    match fs::metadata(&index_path).await {
        Ok(index_meta) if index_meta.is_file() => serve_file(req, &index_path, &index_meta).await,
        _ => list_directory(&file_path).await,
    }
}

async fn serve_file(req: &Parts, file_path: &Path, meta: &Metadata) -> Response<Full<Bytes>> {
    let validators = Validators::from_metadata(meta);
    let header = |name: HeaderName| req.headers.get(name).and_then(|v| v.to_str().ok());

    if validators.is_not_modified(header(IF_NONE_MATCH), header(IF_MODIFIED_SINCE)) {
        return http::build_304_response(&validators.etag, validators.last_modified.as_deref());
    }

    let content = match fs::read(file_path).await {
        Ok(c) => Bytes::from(c),
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", file_path.display()));
            return http::build_404_response();
        }
    };

    let headers = FileHeaders {
        content_type: mime::content_type_for(file_path),
        etag: &validators.etag,
        last_modified: validators.last_modified.as_deref(),
    };
    let total = content.len() as u64;

    match http::parse_range(header(RANGE), total) {
        RangeSpec::Partial(range) => {
            #[allow(clippy::cast_possible_truncation)]
            let slice = content.slice(range.start as usize..=range.end as usize);
            http::response::build_file_response(slice, &headers, Some((range.start, range.end, total)))
        }
        RangeSpec::Unsatisfiable => http::build_416_response(total),
        RangeSpec::Full => http::response::build_file_response(content, &headers, None),
    }
}

/// Render a directory as a `<pre>` list of links, sorted by name
async fn list_directory(dir: &Path) -> Response<Full<Bytes>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            logger::log_error(&format!("Failed to read directory '{}': {e}", dir.display()));
            return http::build_404_response();
        }
    };

    let mut names = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    name.push('/');
                }
                names.push(name);
            }
            Ok(None) => break,
            Err(e) => {
                logger::log_error(&format!("Failed to read directory '{}': {e}", dir.display()));
                return http::build_404_response();
            }
        }
    }
    names.sort();

    let mut html = String::from("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n");
    for name in &names {
        let (stem, slash) = name
            .strip_suffix('/')
            .map_or((name.as_str(), ""), |stem| (stem, "/"));
        html.push_str(&format!(
            "<a href=\"{}{slash}\">{}</a>\n",
            urlencoding::encode(stem),
            escape_html(name)
        ));
    }
    html.push_str("</pre>\n");
    http::build_html_response(html)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Map a URI path onto a file inside `root`
///
/// The empty path maps to the root itself. Returns `None` for undecodable
/// paths, missing files and anything that resolves outside the root.
async fn resolve_path(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;
    let relative = decoded.trim_start_matches('/');
    if relative.contains('\0') {
        return None;
    }

    // Missing file is the common 404 case, no need to log it
    let canonical = fs::canonicalize(root.join(relative)).await.ok()?;
    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {uri_path} -> {}",
            canonical.display()
        ));
        return None;
    }
    Some(canonical)
}
