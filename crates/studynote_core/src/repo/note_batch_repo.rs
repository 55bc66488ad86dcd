//! Note batch persistence.
//!
//! # Responsibility
//! - Write validated batches as indented JSON documents.
//! - Read saved batches back with full validation.
//!
//! # Invariants
//! - Writes go to a sibling temp file first and are renamed into place, so a
//!   failed write never leaves a truncated document behind.
//! - Read paths reject invalid persisted notes instead of masking them.

use crate::model::note::NoteBatch;
use log::{error, info};
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum NoteBatchRepoError {
    Io { path: PathBuf, source: io::Error },
    Serialize(serde_json::Error),
    InvalidData { path: PathBuf, source: serde_json::Error },
}

impl Display for NoteBatchRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to access {}: {source}", path.display()),
            Self::Serialize(err) => write!(f, "failed to serialize notes: {err}"),
            Self::InvalidData { path, source } => {
                write!(f, "invalid notes document {}: {source}", path.display())
            }
        }
    }
}

impl Error for NoteBatchRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::InvalidData { source, .. } => Some(source),
        }
    }
}

/// Destination for validated note batches.
pub trait NoteBatchRepository {
    fn save(&self, batch: &NoteBatch) -> Result<(), NoteBatchRepoError>;
    fn load(&self) -> Result<NoteBatch, NoteBatchRepoError>;
}

/// JSON document on the local file system.
pub struct JsonFileNoteBatchRepository {
    path: PathBuf,
}

impl JsonFileNoteBatchRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| OsString::from("notes"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> NoteBatchRepoError {
        NoteBatchRepoError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl NoteBatchRepository for JsonFileNoteBatchRepository {
    fn save(&self, batch: &NoteBatch) -> Result<(), NoteBatchRepoError> {
        let mut document =
            serde_json::to_string_pretty(batch).map_err(NoteBatchRepoError::Serialize)?;
        document.push('\n');

        let temp_path = self.temp_path();
        let written = std::fs::write(&temp_path, document)
            .and_then(|()| std::fs::rename(&temp_path, &self.path));
        if let Err(source) = written {
            let _ = std::fs::remove_file(&temp_path);
            error!(
                "event=notes_save module=repo status=error path={} error={}",
                self.path.display(),
                source
            );
            return Err(self.io_error(source));
        }

        info!(
            "event=notes_save module=repo status=ok path={} count={}",
            self.path.display(),
            batch.len()
        );
        Ok(())
    }

    fn load(&self) -> Result<NoteBatch, NoteBatchRepoError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        serde_json::from_str(&content).map_err(|source| NoteBatchRepoError::InvalidData {
            path: self.path.clone(),
            source,
        })
    }
}
