//! Study note generation use-case.
//!
//! # Responsibility
//! - Submit the fixed note generation request against the session.
//! - Validate the returned text and persist only fully valid batches.
//!
//! # Invariants
//! - Nothing is written unless extraction succeeded.
//! - A count warning never blocks persistence.

use crate::extract::notes::{extract_notes, CountWarning};
use crate::model::note::{NoteBatch, EXPECTED_NOTE_COUNT, NOTE_ID_MAX, SUMMARY_MAX_CHARS};
use crate::remote::{AssistantService, SessionId};
use crate::repo::note_batch_repo::NoteBatchRepository;
use crate::service::StageError;
use log::{debug, info};
use once_cell::sync::Lazy;

/// Run instructions for note generation.
pub static NOTES_INSTRUCTIONS: Lazy<String> = Lazy::new(|| {
    format!(
        "You are a study summarizer. Produce exactly {EXPECTED_NOTE_COUNT} distinct revision \
         notes using only the documents available to your file_search tool, with no outside \
         knowledge. Every note has: id (integer from 1 to {NOTE_ID_MAX}), heading (string), \
         summary (string of at most {SUMMARY_MAX_CHARS} characters) and page_ref (the page \
         number printed in the document, or null). Only give a page_ref you can read from the \
         document itself; when unsure use null. Reply with a single JSON object of the form \
         {{\"notes\": [...]}} and nothing else, without Markdown code fences. If the documents \
         do not hold enough material for {EXPECTED_NOTE_COUNT} notes, return as many as you can."
    )
});

/// User message that starts the generation thread.
pub const NOTES_REQUEST: &str = "Please generate 10 exam revision notes from the provided \
course material, focusing on key concepts, definitions and important facts in the document.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesReport {
    pub saved: usize,
    pub warning: Option<CountWarning>,
}

pub struct NotesService<S: AssistantService, W: NoteBatchRepository> {
    service: S,
    output: W,
}

impl<S: AssistantService, W: NoteBatchRepository> NotesService<S, W> {
    pub fn new(service: S, output: W) -> Self {
        Self { service, output }
    }

    /// Submits the generation request and returns the raw response text.
    pub fn request_notes(&self, session: &SessionId) -> Result<String, StageError> {
        let outcome = self
            .service
            .submit_request(session, NOTES_INSTRUCTIONS.as_str(), NOTES_REQUEST)?
            .ensure_completed("generate_notes")?;
        let text = outcome
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or(StageError::NoResponse)?;

        debug!(
            "event=notes_response module=service status=ok chars={}",
            text.chars().count()
        );
        Ok(text)
    }

    /// Validates a raw response and persists the resulting batch.
    pub fn save_notes(&self, response: &str) -> Result<NotesReport, StageError> {
        let extracted = extract_notes(response)?;
        self.output.save(&extracted.batch)?;

        info!(
            "event=notes_generate module=service status=ok saved={}",
            extracted.batch.len()
        );
        Ok(NotesReport {
            saved: extracted.batch.len(),
            warning: extracted.warning,
        })
    }

    /// Requests, validates and persists in one call.
    pub fn generate(&self, session: &SessionId) -> Result<NotesReport, StageError> {
        let response = self.request_notes(session)?;
        self.save_notes(&response)
    }

    /// Reads back the last persisted batch.
    pub fn saved_notes(&self) -> Result<NoteBatch, StageError> {
        Ok(self.output.load()?)
    }
}
