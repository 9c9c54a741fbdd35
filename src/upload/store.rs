//! Writing accepted parts into the root directory

use std::collections::HashSet;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::form::FilePart;

/// What happened to one received file part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartStatus {
    Stored { bytes: u64 },
    /// Key not listed in the token's `imageUuids`
    Undeclared,
    /// Declared, but the file could not be opened or written
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartOutcome {
    pub name: String,
    pub status: PartStatus,
}

/// Per-identifier result of one upload request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// One entry per received file part, in arrival order
    pub outcomes: Vec<PartOutcome>,
    /// Declared identifiers for which no part arrived
    pub missing: Vec<String>,
}

impl UploadReport {
    /// Names actually written, in arrival order
    pub fn uploaded(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PartStatus::Stored { .. }))
            .map(|o| o.name.clone())
            .collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = &PartOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PartStatus::Failed { .. }))
    }
}

/// Persist every declared part under `root`; a failing part never stops the rest
pub async fn store_parts(root: &Path, parts: &[FilePart], declared: &[String]) -> UploadReport {
    let declared_set: HashSet<&str> = declared.iter().map(String::as_str).collect();
    let mut report = UploadReport::default();

    for part in parts {
        let status = if declared_set.contains(part.name.as_str()) {
            match write_part(root, part).await {
                Ok(bytes) => PartStatus::Stored { bytes },
                Err(e) => PartStatus::Failed {
                    reason: e.to_string(),
                },
            }
        } else {
            PartStatus::Undeclared
        };
        report.outcomes.push(PartOutcome {
            name: part.name.clone(),
            status,
        });
    }

    let received: HashSet<&str> = parts.iter().map(|p| p.name.as_str()).collect();
    report.missing = declared
        .iter()
        .filter(|id| !received.contains(id.as_str()))
        .cloned()
        .collect();

    report
}

/// Create or truncate `root/name` and copy the part into it
async fn write_part(root: &Path, part: &FilePart) -> std::io::Result<u64> {
    if !is_plain_file_name(&part.name) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("'{}' is not a plain file name", part.name),
        ));
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o644);

    let mut file = options.open(root.join(&part.name)).await?;
    file.write_all(&part.content).await?;
    file.flush().await?;
    Ok(part.content.len() as u64)
}

/// A single path component that stays inside the root directory
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
