// Application state module
// Holds the configuration and the resolved root directory shared by all connections

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::error::StartupError;

/// Application state
///
/// Built once at startup and shared behind an `Arc`; nothing in it changes
/// while the server runs.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// Absolute, canonical root directory
    pub root: PathBuf,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let root = resolve_root(&config.storage.root)?;
        Ok(Self { config, root })
    }
}

/// Resolve the configured root to an absolute path and require a directory
pub fn resolve_root(path: &Path) -> Result<PathBuf, StartupError> {
    let root = path
        .canonicalize()
        .map_err(|source| StartupError::RootUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    let meta = std::fs::metadata(&root).map_err(|source| StartupError::RootUnavailable {
        path: root.clone(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(StartupError::RootNotDirectory { path: root });
    }

    Ok(root)
}
