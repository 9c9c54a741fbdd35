//! Startup error types
//!
//! Request-level failures live next to the code that produces them
//! (`token::TokenError`, `upload::UploadError`); this module only covers
//! the conditions that stop the process before it serves anything.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    Address {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("root directory '{}' is not usable: {source}", path.display())]
    RootUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not dir", path.display())]
    RootNotDirectory { path: PathBuf },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("failed to initialize logging: {0}")]
    Logger(String),

    #[error("failed to build runtime: {0}")]
    Runtime(std::io::Error),
}
