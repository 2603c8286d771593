//! Data persistence layer
//!
//! A [`JsonStore`] keeps one serializable value in a file, wrapped with a
//! schema version and an md5 checksum so a truncated or hand-edited file is
//! reported instead of silently loaded.

use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Persistence error types
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Corruption detected
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Version mismatch
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },
}

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// On-disk wrapper
#[derive(Debug, Serialize, serde::Deserialize)]
struct Versioned<T> {
    version: u32,
    checksum: String,
    data: T,
}

fn checksum_of<T: Serialize>(data: &T) -> Result<String> {
    let json = serde_json::to_string(data)?;
    Ok(format!("{:x}", md5::compute(json.as_bytes())))
}

/// File-backed store for a single value
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    version: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a store at `path` with schema version 1
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), version: 1, _marker: PhantomData }
    }

    /// Set the schema version
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored value; `None` if nothing was saved yet
    pub async fn load(&self) -> Result<Option<T>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let versioned: Versioned<T> = serde_json::from_str(&contents)
            .map_err(|e| PersistenceError::Corruption(format!("unreadable file: {}", e)))?;

        if versioned.version != self.version {
            return Err(PersistenceError::VersionMismatch {
                expected: self.version,
                found: versioned.version,
            });
        }

        let computed = checksum_of(&versioned.data)?;
        if computed != versioned.checksum {
            return Err(PersistenceError::Corruption(format!(
                "Checksum mismatch: expected {}, got {}",
                versioned.checksum, computed
            )));
        }

        Ok(Some(versioned.data))
    }

    /// Save a value, replacing the file atomically
    pub async fn save(&self, data: &T) -> Result<()> {
        let versioned = Versioned {
            version: self.version,
            checksum: checksum_of(data)?,
            data,
        };
        let json = serde_json::to_string_pretty(&versioned)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    /// Remove the stored value; succeeds if nothing was stored
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
