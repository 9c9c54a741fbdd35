//! Request handler module
//!
//! Method dispatch for the shared root directory: GET requests are read by
//! the static reader, POST requests go through the upload gate.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
