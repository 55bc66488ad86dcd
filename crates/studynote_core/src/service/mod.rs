//! Stage use-case services.
//!
//! # Responsibility
//! - Orchestrate the remote service, local repositories and extraction for
//!   each stage: bootstrap, query, notes and teardown.
//! - Surface every failure with diagnostic context through `StageError`.
//!
//! # Invariants
//! - Services receive the session id explicitly; only bootstrap writes it.

pub mod bootstrap_service;
pub mod notes_service;
pub mod query_service;
pub mod teardown_service;

use crate::config::ConfigError;
use crate::extract::notes::NoteExtractionError;
use crate::remote::RemoteError;
use crate::repo::note_batch_repo::NoteBatchRepoError;
use crate::repo::session_repo::SessionRepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Failure of one stage run.
#[derive(Debug)]
pub enum StageError {
    Config(ConfigError),
    Session(SessionRepoError),
    Remote(RemoteError),
    Extraction(NoteExtractionError),
    Output(NoteBatchRepoError),
    /// A source document could not be read before upload.
    Document { path: PathBuf, source: io::Error },
    /// The run completed without any assistant text.
    NoResponse,
}

impl Display for StageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
            Self::Extraction(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "{err}"),
            Self::Document { path, source } => {
                write!(f, "failed to read document {}: {source}", path.display())
            }
            Self::NoResponse => write!(f, "assistant did not provide a usable text response"),
        }
    }
}

impl Error for StageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::Extraction(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Document { source, .. } => Some(source),
            Self::NoResponse => None,
        }
    }
}

impl From<ConfigError> for StageError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SessionRepoError> for StageError {
    fn from(value: SessionRepoError) -> Self {
        Self::Session(value)
    }
}

impl From<RemoteError> for StageError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<NoteExtractionError> for StageError {
    fn from(value: NoteExtractionError) -> Self {
        Self::Extraction(value)
    }
}

impl From<NoteBatchRepoError> for StageError {
    fn from(value: NoteBatchRepoError) -> Self {
        Self::Output(value)
    }
}
