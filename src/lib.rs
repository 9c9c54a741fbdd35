//! Local image store
//!
//! Serves a flat directory over HTTP: GET downloads a stored file, POST
//! uploads the multipart parts named by a base64(JSON) token and answers
//! with a token listing what was written.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod token;
pub mod upload;
