//! HTTP protocol layer module
//!
//! Protocol helpers shared by the static reader and the upload gate:
//! response builders, CORS, content types, validators and ranges.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use range::{parse_range, ByteRange, RangeSpec};
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_416_response, build_html_response, build_redirect_response, build_text_response,
    build_token_response,
};
