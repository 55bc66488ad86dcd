//! Core logic for the study notes assistant stages.
//! This crate owns every validation rule; the CLI only wires stages together.

pub mod config;
pub mod extract;
pub mod logging;
pub mod model;
pub mod query;
pub mod remote;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use extract::defence::strip_code_fences;
pub use extract::notes::{
    extract_notes, parse_response, CountWarning, ExtractedNotes, NoteExtractionError, RecordError,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    Note, NoteBatch, NoteValidationError, EXPECTED_NOTE_COUNT, NOTE_ID_MAX, NOTE_ID_MIN,
    SUMMARY_MAX_CHARS,
};
pub use query::classifier::{
    build_query_request, classify_question, is_exit_command, InstructionProfile, QueryRequest,
};
pub use remote::{
    AssistantService, Citation, DocumentId, IndexBuild, IndexId, OpenAiAssistantService,
    PollPolicy, RemoteError, RemoteResource, RemoteResult, RemoteStatus, ResourceFilter,
    ResourceKind, RunOutcome, RunStep, SessionConfig, SessionId,
};
pub use repo::note_batch_repo::{
    JsonFileNoteBatchRepository, NoteBatchRepoError, NoteBatchRepository,
};
pub use repo::session_repo::{FileSessionRepository, SessionRepoError, SessionRepository};
pub use service::bootstrap_service::{BootstrapPlan, BootstrapReport, BootstrapService};
pub use service::notes_service::{NotesReport, NotesService};
pub use service::query_service::{QueryAnswer, QueryService};
pub use service::teardown_service::{default_filters, TeardownReport, TeardownService};
pub use service::StageError;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
