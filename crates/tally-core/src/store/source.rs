//! The bundled default snapshot consulted when the slot is empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;
use crate::model::snapshot::{Snapshot, SnapshotError};

use super::slot::SlotError;

/// Why one step of the bootstrap chain produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("slot is empty")]
    Missing,

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("stored snapshot rejected: {0}")]
    Invalid(#[from] SnapshotError),

    #[error("failed to read default {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to fetch default {location}: {reason}")]
    Fetch { location: String, reason: String },
}

impl LoadError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Missing => ErrorCode::NotInitialized,
            Self::Slot(err) => err.code(),
            Self::Invalid(_) => ErrorCode::SnapshotInvalid,
            Self::Io { .. } | Self::Fetch { .. } => ErrorCode::DefaultFetchFailed,
        }
    }
}

/// Where a bundled default snapshot comes from.
pub trait DefaultSource {
    /// Fetch and validate the default snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the resource is unreachable or invalid.
    fn fetch(&self) -> Result<Snapshot, LoadError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// A default snapshot stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DefaultSource for FileSource {
    fn fetch(&self) -> Result<Snapshot, LoadError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Snapshot::from_json(&raw)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
