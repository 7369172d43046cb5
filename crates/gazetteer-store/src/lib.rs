//! Gazetteer Storage Layer
//!
//! Implements the `HarvestStore` trait on top of a single pretty-printed JSON
//! document.
//!
//! # Architecture
//!
//! - One file holds the whole `group → unit → records` document
//! - Every `put` is a full read-modify-write cycle under one async mutex
//! - Writes go to a sibling temp file which is fsynced and then renamed over
//!   the target, so the file on disk is always a complete document
//!
//! # Examples
//!
//! ```no_run
//! use gazetteer_store::JsonFileStore;
//! use gazetteer_domain::HarvestStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), gazetteer_store::StoreError> {
//! let store = JsonFileStore::new("osint_sources.json");
//! let document = store.load().await?;
//! println!("{} units already harvested", document.unit_count());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod export;

use async_trait::async_trait;
use gazetteer_domain::{HarvestStore, PutOutcome, Record, StoreDocument};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use export::{export_group, export_path, paths_collide, sanitize_file_component};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation touched
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The backing file exists but does not hold a valid document
    #[error("Corrupt store file {path}: {source}")]
    Corrupt {
        /// File that failed to decode
        path: PathBuf,
        /// Decode error
        source: serde_json::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// JSON-file implementation of [`HarvestStore`]
///
/// # Thread Safety
///
/// Share one instance (behind an `Arc`) between all workers of a run. The
/// instance owns the only lock on its file; two instances pointed at the same
/// path are not coordinated.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`
    ///
    /// Nothing touches the filesystem until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Option<StoreDocument>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    path: self.path.clone(),
                    source,
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

#[async_trait]
impl HarvestStore for JsonFileStore {
    type Error = StoreError;

    async fn load(&self) -> Result<StoreDocument, Self::Error> {
        let _guard = self.lock.lock().await;

        match self.read_document().await? {
            Some(document) => {
                debug!(
                    path = %self.path.display(),
                    units = document.unit_count(),
                    "Loaded store"
                );
                Ok(document)
            }
            None => {
                let document = StoreDocument::new();
                write_json_atomic(&self.path, &document).await?;
                info!("Initialized new file: {}", self.path.display());
                Ok(document)
            }
        }
    }

    async fn has(&self, group: &str, unit: &str) -> Result<bool, Self::Error> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_document()
            .await?
            .is_some_and(|document| document.contains(group, unit)))
    }

    async fn put(
        &self,
        group: &str,
        unit: &str,
        records: Vec<Record>,
    ) -> Result<PutOutcome, Self::Error> {
        let _guard = self.lock.lock().await;

        let mut document = self.read_document().await?.unwrap_or_default();
        let count = records.len();
        if !document.insert_unit(group, unit, records) {
            debug!(group, unit, "Unit already stored, skipping write");
            return Ok(PutOutcome::AlreadyPresent);
        }

        write_json_atomic(&self.path, &document).await?;
        info!(group, unit, records = count, "Saved unit");
        Ok(PutOutcome::Inserted)
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Durably replace `path` with the pretty-printed JSON of `value`
///
/// The bytes are written to `<path>.tmp`, flushed to disk, then renamed over
/// `path`. Readers see either the old file or the new one, never a mix.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path)
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    file.write_all(&bytes)
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    drop(file);

    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| StoreError::io(path, e))
}
