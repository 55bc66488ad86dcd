//! Remote document-QA service contracts.
//!
//! # Responsibility
//! - Define the capability set the stages need from a hosted assistant
//!   service: sessions, document upload, indexing, runs and cleanup.
//! - Keep wire details inside concrete implementations (`openai`).
//!
//! # Invariants
//! - Every call blocks until the remote operation reaches a terminal status
//!   or the configured poll bound is exceeded.
//! - A non-success terminal status is data (`RemoteStatus`), turned into an
//!   error by the caller through `ensure_*` helpers.

pub mod openai;
pub mod poll;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub use openai::OpenAiAssistantService;
pub use poll::{wait_until, PollError, PollPolicy};

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

remote_id!(
    /// Opaque identifier of a remote assistant session.
    SessionId
);
remote_id!(
    /// Opaque identifier of an uploaded document.
    DocumentId
);
remote_id!(
    /// Opaque identifier of a remote searchable index.
    IndexId
);

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug)]
pub enum RemoteError {
    /// Transport failure before a response arrived.
    Network(String),
    /// Non-success HTTP response.
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },
    /// Response body did not match the expected shape.
    Decode(String),
    /// Operation reached a terminal status other than success.
    OperationFailed {
        operation: &'static str,
        status: String,
        detail: Option<String>,
    },
    /// Operation did not reach a terminal status within the poll bound.
    Timeout {
        operation: &'static str,
        waited: Duration,
    },
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Api {
                operation,
                status,
                body,
            } => write!(f, "{operation} rejected with HTTP {status}: {body}"),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
            Self::OperationFailed {
                operation,
                status,
                detail,
            } => {
                write!(f, "{operation} ended with status `{status}`")?;
                if let Some(detail) = detail {
                    write!(f, ": {detail}")?;
                }
                Ok(())
            }
            Self::Timeout { operation, waited } => write!(
                f,
                "{operation} did not finish within {}s",
                waited.as_secs()
            ),
        }
    }
}

impl Error for RemoteError {}

/// Lifecycle status reported by the remote service for runs and index builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Queued,
    InProgress,
    Cancelling,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    Incomplete,
    Expired,
    Other(String),
}

impl RemoteStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "cancelling" => Self::Cancelling,
            "requires_action" => Self::RequiresAction,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            "incomplete" => Self::Incomplete,
            "expired" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Cancelling => "cancelling",
            Self::RequiresAction => "requires_action",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Other(value) => value,
        }
    }

    /// No further progress happens once a status is terminal.
    ///
    /// `requires_action` counts as terminal: no tool outputs are ever
    /// submitted, so the run cannot advance on its own.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::InProgress | Self::Cancelling)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl Display for RemoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote assistant configuration used when creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub name: String,
    pub instructions: String,
    pub model: String,
    /// Enables the document search tool on the session.
    pub document_search: bool,
}

/// Name given to sessions created by the bootstrap stage.
pub const STUDY_SESSION_NAME: &str = "Study Q&A Assistant";

const STUDY_SESSION_INSTRUCTIONS: &str = "You are a helpful tutor. Use the knowledge \
in the attached files to answer questions. Cite sources where possible.";

impl SessionConfig {
    /// Tutor session with document search enabled.
    pub fn study_assistant(model: impl Into<String>) -> Self {
        Self {
            name: STUDY_SESSION_NAME.to_string(),
            instructions: STUDY_SESSION_INSTRUCTIONS.to_string(),
            model: model.into(),
            document_search: true,
        }
    }
}

/// Terminal snapshot of an index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBuild {
    pub index_id: IndexId,
    pub status: RemoteStatus,
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
}

impl IndexBuild {
    pub fn ensure_completed(self) -> RemoteResult<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(RemoteError::OperationFailed {
            operation: "build_index",
            status: self.status.to_string(),
            detail: Some(format!(
                "{}/{} documents indexed, {} failed",
                self.completed, self.total, self.failed
            )),
        })
    }
}

/// Citation annotation attached to a run's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub document_id: DocumentId,
    /// Marker text inside the answer the citation is attached to.
    pub marker: String,
}

/// Summary of one processing step of a run, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStep {
    pub id: String,
    pub kind: String,
    pub status: RemoteStatus,
    pub last_error: Option<String>,
}

impl Display for RunStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} type={} status={}", self.id, self.kind, self.status)?;
        if let Some(error) = &self.last_error {
            write!(f, " error={error}")?;
        }
        Ok(())
    }
}

/// Terminal outcome of a submitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RemoteStatus,
    /// Newest assistant-authored text, when the run produced one.
    pub text: Option<String>,
    pub citations: Vec<Citation>,
    /// Whether any run step invoked the document search tool.
    pub document_search_used: bool,
    pub last_error: Option<String>,
    pub steps: Vec<RunStep>,
}

impl RunOutcome {
    /// Converts a non-success terminal status into `OperationFailed`.
    ///
    /// The error detail carries the run's last error and its step summaries.
    pub fn ensure_completed(self, operation: &'static str) -> RemoteResult<Self> {
        if self.status.is_success() {
            return Ok(self);
        }

        let mut detail = self
            .last_error
            .clone()
            .unwrap_or_else(|| "no error reported".to_string());
        for step in &self.steps {
            detail.push_str("; ");
            detail.push_str(&step.to_string());
        }

        Err(RemoteError::OperationFailed {
            operation,
            status: self.status.to_string(),
            detail: Some(detail),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Session,
    Document,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Document => "document",
        }
    }
}

/// Remote resource as seen by listing calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    pub id: String,
    pub kind: ResourceKind,
    pub name: String,
    pub purpose: Option<String>,
}

/// Selection applied to listed resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    pub kind: ResourceKind,
    /// Case-insensitive substring the resource name must contain.
    pub name_contains: Option<String>,
    /// Exact purpose the resource must carry.
    pub purpose: Option<String>,
}

impl ResourceFilter {
    pub fn kind(kind: ResourceKind) -> Self {
        Self {
            kind,
            name_contains: None,
            purpose: None,
        }
    }

    pub fn name_contains(mut self, fragment: impl Into<String>) -> Self {
        self.name_contains = Some(fragment.into());
        self
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn matches(&self, resource: &RemoteResource) -> bool {
        if resource.kind != self.kind {
            return false;
        }
        if let Some(fragment) = &self.name_contains {
            if !resource
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase())
            {
                return false;
            }
        }
        if let Some(purpose) = &self.purpose {
            if resource.purpose.as_deref() != Some(purpose.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Capability set of the hosted document-QA service.
pub trait AssistantService {
    fn create_session(&self, config: &SessionConfig) -> RemoteResult<SessionId>;
    fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> RemoteResult<DocumentId>;
    /// Builds an index over the documents and blocks until the build is terminal.
    fn build_index(&self, name: &str, documents: &[DocumentId]) -> RemoteResult<IndexBuild>;
    fn bind_index(&self, session: &SessionId, index: &IndexId) -> RemoteResult<()>;
    /// Submits one request and blocks until the run is terminal.
    fn submit_request(
        &self,
        session: &SessionId,
        instructions: &str,
        content: &str,
    ) -> RemoteResult<RunOutcome>;
    fn list_resources(&self, filter: &ResourceFilter) -> RemoteResult<Vec<RemoteResource>>;
    fn delete_resource(&self, kind: ResourceKind, id: &str) -> RemoteResult<()>;
}

impl<T: AssistantService + ?Sized> AssistantService for &T {
    fn create_session(&self, config: &SessionConfig) -> RemoteResult<SessionId> {
        (**self).create_session(config)
    }

    fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> RemoteResult<DocumentId> {
        (**self).upload_document(file_name, bytes)
    }

    fn build_index(&self, name: &str, documents: &[DocumentId]) -> RemoteResult<IndexBuild> {
        (**self).build_index(name, documents)
    }

    fn bind_index(&self, session: &SessionId, index: &IndexId) -> RemoteResult<()> {
        (**self).bind_index(session, index)
    }

    fn submit_request(
        &self,
        session: &SessionId,
        instructions: &str,
        content: &str,
    ) -> RemoteResult<RunOutcome> {
        (**self).submit_request(session, instructions, content)
    }

    fn list_resources(&self, filter: &ResourceFilter) -> RemoteResult<Vec<RemoteResource>> {
        (**self).list_resources(filter)
    }

    fn delete_resource(&self, kind: ResourceKind, id: &str) -> RemoteResult<()> {
        (**self).delete_resource(kind, id)
    }
}
