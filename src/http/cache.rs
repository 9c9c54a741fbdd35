//! HTTP cache validator module
//!
//! Files on disk change underneath the server whenever a client re-uploads
//! under the same name, so validators are derived from metadata (size and
//! modification time) rather than from content.

use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::time::SystemTime;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Validators for one file
#[derive(Debug, Clone)]
pub struct Validators {
    /// Quoted `ETag` of size, seconds and nanoseconds, e.g. `"1a-65f0c3b2-1dcd6500"`
    pub etag: String,
    /// HTTP-date form of the modification time
    pub last_modified: Option<String>,
    modified: Option<DateTime<Utc>>,
}

impl Validators {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self::new(meta.len(), meta.modified().ok())
    }

    pub fn new(size: u64, modified: Option<SystemTime>) -> Self {
        let modified: Option<DateTime<Utc>> = modified.map(DateTime::from);
        let secs = modified.map_or(0, |m| m.timestamp());
        let nanos = modified.map_or(0, |m| m.timestamp_subsec_nanos());
        Self {
            etag: format!("\"{size:x}-{secs:x}-{nanos:x}\""),
            last_modified: modified.map(|m| m.format(HTTP_DATE).to_string()),
            modified,
        }
    }

    /// Whether the client's cached copy is still fresh (respond 304)
    ///
    /// `If-None-Match` wins over `If-Modified-Since` when both are sent.
    pub fn is_not_modified(&self, if_none_match: Option<&str>, if_modified_since: Option<&str>) -> bool {
        if let Some(tags) = if_none_match {
            return tags
                .split(',')
                .map(str::trim)
                .any(|tag| tag == "*" || tag.trim_start_matches("W/") == self.etag);
        }

        let (Some(since), Some(modified)) = (if_modified_since, self.modified) else {
            return false;
        };
        DateTime::parse_from_rfc2822(since.trim())
            .is_ok_and(|since| modified.timestamp() <= since.timestamp())
    }
}
