// Configuration module entry point
// Loads layered configuration and builds the immutable runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::StartupError;

// Re-export public types
pub use state::{resolve_root, AppState};
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_FILE: &str = "config";

/// Values given on the command line; they win over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources in increasing priority: defaults, the file (optional),
    /// `HSNS_*` environment variables, command-line overrides.
    pub fn load_from(config_path: &str, overrides: &Overrides) -> Result<Self, StartupError> {
        let root = overrides
            .root
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(config_path).required(false))
            .add_source(
                ::config::Environment::with_prefix("HSNS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("storage.root", "./temp")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.keep_alive", true)?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 33_554_432)? // 32MB
            .set_override_option("storage.root", root)?
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| StartupError::Address { addr, source })
    }
}
