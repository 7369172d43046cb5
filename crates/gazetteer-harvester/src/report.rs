//! Failure report: the units a run could not collect

use crate::HarvestError;
use gazetteer_domain::Unit;
use gazetteer_store::write_json_atomic;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

/// Characters of raw provider output kept in a report entry
pub const RAW_RESPONSE_LIMIT: usize = 500;

/// One failed unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Group the unit belongs to
    pub group: String,
    /// Unit name
    pub unit: String,
    /// What went wrong
    pub reason: String,
    /// Start of the offending response, when there was one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl FailureEntry {
    /// Create an entry, truncating `raw_response` to [`RAW_RESPONSE_LIMIT`] characters
    pub fn new(unit: &Unit, reason: impl Into<String>, raw_response: Option<&str>) -> Self {
        Self {
            group: unit.group().name().to_string(),
            unit: unit.name().to_string(),
            reason: reason.into(),
            raw_response: raw_response.map(|raw| raw.chars().take(RAW_RESPONSE_LIMIT).collect()),
        }
    }

    /// Rebuild the unit this entry refers to
    pub fn to_unit(&self) -> Result<Unit, HarvestError> {
        gazetteer_domain::Group::new(self.group.as_str())
            .and_then(|group| group.unit(self.unit.as_str()))
            .map_err(HarvestError::Report)
    }
}

/// Read a failure report; a missing file reads as an empty report
pub async fn read_report(path: &Path) -> Result<Vec<FailureEntry>, HarvestError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| HarvestError::Report(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(HarvestError::Report(format!("{}: {}", path.display(), e))),
    }
}

/// Write `entries` as a pretty JSON array
pub async fn write_report(path: &Path, entries: &[FailureEntry]) -> Result<(), HarvestError> {
    write_json_atomic(path, entries)
        .await
        .map_err(|e| HarvestError::Report(e.to_string()))?;
    info!("[REPORT] Wrote failures to {} ({} issues)", path.display(), entries.len());
    Ok(())
}

/// Delete the report file if it exists
pub async fn remove_report(path: &Path) -> Result<(), HarvestError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("Removed failure report {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HarvestError::Report(format!("{}: {}", path.display(), e))),
    }
}
