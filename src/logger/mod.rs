//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Upload outcome reporting
//!
//! Everything is emitted through `tracing`; access lines use the `access` target.

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::error::StartupError;
use crate::upload::{PartStatus, UploadReport};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`. Should be called once at
/// application startup.
pub fn init(config: &Config) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| StartupError::Logger(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| StartupError::Logger(e.to_string()))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, root: &std::path::Path) {
    tracing::info!("Server started, listening on http://{addr}");
    tracing::info!("Root directory: {}", root.display());
    tracing::info!(
        "CORS: {}, max upload body: {} bytes",
        if config.http.enable_cors { "enabled" } else { "disabled" },
        config.http.max_body_size
    );
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("Accepted connection from {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

/// Log the per-identifier result of one upload request
pub fn log_upload_report(report: &UploadReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            PartStatus::Stored { bytes } => {
                tracing::info!(name = %outcome.name, bytes, "Stored upload");
            }
            PartStatus::Undeclared => {
                tracing::debug!(name = %outcome.name, "Ignored undeclared part");
            }
            PartStatus::Failed { reason } => {
                tracing::warn!(name = %outcome.name, %reason, "Failed to store upload");
            }
        }
    }
    if !report.missing.is_empty() {
        tracing::debug!(missing = ?report.missing, "Declared identifiers without a part");
    }
}

pub fn log_shutdown_requested(signal: &str) {
    tracing::info!("{signal} received, shutting down gracefully");
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        tracing::info!("All connections closed, bye");
    } else {
        tracing::warn!("Shutdown grace period elapsed with {remaining} connection(s) still open");
    }
}
