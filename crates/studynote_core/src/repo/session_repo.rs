//! Session identifier persistence.
//!
//! # Responsibility
//! - Hand the session id created by bootstrap to later stages explicitly.
//!
//! # Invariants
//! - The marker file holds only the id; surrounding whitespace is ignored.
//! - An absent marker is a missing prerequisite, not an empty session.

use crate::remote::SessionId;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SessionRepoError {
    /// No session was stored yet; the bootstrap stage has to run first.
    Missing(PathBuf),
    /// The marker exists but holds no id.
    Empty(PathBuf),
    Io { path: PathBuf, source: io::Error },
}

impl Display for SessionRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(path) => write!(
                f,
                "{} not found; run studynote-bootstrap first",
                path.display()
            ),
            Self::Empty(path) => write!(
                f,
                "{} is empty; run studynote-bootstrap again",
                path.display()
            ),
            Self::Io { path, source } => write!(f, "failed to access {}: {source}", path.display()),
        }
    }
}

impl Error for SessionRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Storage for the active session identifier.
pub trait SessionRepository {
    fn load(&self) -> Result<SessionId, SessionRepoError>;
    fn save(&self, session: &SessionId) -> Result<(), SessionRepoError>;
}

/// Plain-text marker file holding one session id.
pub struct FileSessionRepository {
    path: PathBuf,
}

impl FileSessionRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionRepository for FileSessionRepository {
    fn load(&self) -> Result<SessionId, SessionRepoError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SessionRepoError::Missing(self.path.clone()));
            }
            Err(source) => {
                return Err(SessionRepoError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let id = content.trim();
        if id.is_empty() {
            return Err(SessionRepoError::Empty(self.path.clone()));
        }
        Ok(SessionId::new(id))
    }

    fn save(&self, session: &SessionId) -> Result<(), SessionRepoError> {
        std::fs::write(&self.path, session.as_str()).map_err(|source| SessionRepoError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(
            "event=session_save module=repo status=ok path={}",
            self.path.display()
        );
        Ok(())
    }
}
