//! Stage configuration loaded from the environment.
//!
//! # Responsibility
//! - Load `.env` when present, then read credentials, file locations, poll
//!   bound and logging settings.
//!
//! # Invariants
//! - A missing or blank `OPENAI_API_KEY` is a fatal `ConfigError`.
//! - `log_dir` is always absolute; relative values resolve against the
//!   working directory.

use crate::remote::openai::DEFAULT_BASE_URL;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "STUDYNOTE_MODEL";
pub const DOCUMENTS_VAR: &str = "STUDYNOTE_DOCUMENTS";
pub const INDEX_NAME_VAR: &str = "STUDYNOTE_INDEX_NAME";
pub const SESSION_FILE_VAR: &str = "STUDYNOTE_SESSION_FILE";
pub const NOTES_FILE_VAR: &str = "STUDYNOTE_NOTES_FILE";
pub const POLL_TIMEOUT_VAR: &str = "STUDYNOTE_POLL_TIMEOUT_SECS";
pub const LOG_LEVEL_VAR: &str = "STUDYNOTE_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "STUDYNOTE_LOG_DIR";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DOCUMENT: &str = "data/course_material.pdf";
const DEFAULT_INDEX_NAME: &str = "study_notes_index";
const DEFAULT_SESSION_FILE: &str = ".assistant_id";
const DEFAULT_NOTES_FILE: &str = "exam_notes.json";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required credential is absent or blank.
    MissingCredential(&'static str),
    /// A variable is set to a value that cannot be used.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential(key) => {
                write!(f, "please set {key} in your environment or .env file")
            }
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} value `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved settings shared by every stage.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub documents: Vec<PathBuf>,
    pub index_name: String,
    pub session_file: PathBuf,
    pub notes_file: PathBuf,
    pub poll_timeout: Duration,
    /// `None` means the build-mode default level.
    pub log_level: Option<String>,
    pub log_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("documents", &self.documents)
            .field("index_name", &self.index_name)
            .field("session_file", &self.session_file)
            .field("notes_file", &self.notes_file)
            .field("poll_timeout", &self.poll_timeout)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let cwd = std::env::current_dir().map_err(|_| ConfigError::InvalidValue {
            key: LOG_DIR_VAR,
            value: String::new(),
            reason: "current working directory is unavailable",
        })?;
        Self::from_lookup(&cwd, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(cwd: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(API_KEY_VAR).ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;

        let documents = read(DOCUMENTS_VAR)
            .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string())
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .collect::<Vec<_>>();
        if documents.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: DOCUMENTS_VAR,
                value: lookup(DOCUMENTS_VAR).unwrap_or_default(),
                reason: "at least one document path is required",
            });
        }

        let poll_timeout = match read(POLL_TIMEOUT_VAR) {
            None => Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: POLL_TIMEOUT_VAR,
                        value,
                        reason: "expected a positive number of seconds",
                    })
                }
            },
        };

        let log_dir = read(LOG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));
        let log_dir = if log_dir.is_absolute() {
            log_dir
        } else {
            cwd.join(log_dir)
        };

        Ok(Self {
            api_key,
            base_url: read(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: read(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            documents,
            index_name: read(INDEX_NAME_VAR).unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            session_file: read(SESSION_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            notes_file: read(NOTES_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NOTES_FILE)),
            poll_timeout,
            log_level: read(LOG_LEVEL_VAR),
            log_dir,
        })
    }
}
