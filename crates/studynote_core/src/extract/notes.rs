//! Note batch extraction pipeline.
//!
//! # Responsibility
//! - Turn one generation response into a validated `NoteBatch`.
//! - Report parse failures, per-record validation failures and empty results
//!   with enough context for an operator to see what the model returned.
//!
//! # Invariants
//! - Only code fences are removed before strict JSON parsing.
//! - A missing `notes` key is an empty sequence, not a parse failure.
//! - Any record failure rejects the whole batch; partial batches never escape.
//! - A count other than `EXPECTED_NOTE_COUNT` is a warning, never an error.

use crate::extract::defence::strip_code_fences;
use crate::model::note::{
    join_errors, Note, NoteBatch, NoteValidationError, EXPECTED_NOTE_COUNT,
};
use log::{info, warn};
use serde_json::Value;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for one record, addressed by its position in `notes`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordError {
    /// Zero-based index inside the `notes` array.
    pub index: usize,
    /// The record exactly as received.
    pub raw: Value,
    pub errors: Vec<NoteValidationError>,
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "note #{} {}: {}",
            self.index,
            self.raw,
            join_errors(&self.errors)
        )
    }
}

/// Non-fatal notice that the batch size differs from what was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountWarning {
    pub expected: usize,
    pub actual: usize,
}

impl Display for CountWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected {} notes, but received {}; continuing with received notes",
            self.expected, self.actual
        )
    }
}

/// Successful extraction result.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedNotes {
    pub batch: NoteBatch,
    pub warning: Option<CountWarning>,
}

#[derive(Debug)]
pub enum NoteExtractionError {
    /// The de-fenced text is not valid JSON.
    Parse {
        error: serde_json::Error,
        attempted: String,
    },
    /// Valid JSON, but not an object with an optional `notes` array.
    Shape {
        detail: &'static str,
        attempted: String,
    },
    /// One or more records failed validation.
    Validation(Vec<RecordError>),
    /// No record validated.
    EmptyResult,
}

impl Display for NoteExtractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { error, attempted } => write!(
                f,
                "failed to decode JSON from response: {error}; attempted to parse: {attempted}"
            ),
            Self::Shape { detail, attempted } => write!(
                f,
                "unexpected response shape: {detail}; attempted to parse: {attempted}"
            ),
            Self::Validation(records) => {
                write!(f, "{} note(s) failed validation", records.len())?;
                for record in records {
                    write!(f, "\n  {record}")?;
                }
                Ok(())
            }
            Self::EmptyResult => write!(f, "no notes were successfully validated"),
        }
    }
}

impl Error for NoteExtractionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// De-fences and strictly parses a response into a JSON value.
pub fn parse_response(response: &str) -> Result<Value, NoteExtractionError> {
    let attempted = strip_code_fences(response);
    serde_json::from_str(attempted).map_err(|error| NoteExtractionError::Parse {
        error,
        attempted: attempted.to_string(),
    })
}

/// Runs the full pipeline: de-fence, parse, validate every record, aggregate.
pub fn extract_notes(response: &str) -> Result<ExtractedNotes, NoteExtractionError> {
    let document = parse_response(response)?;
    let records = note_records(&document)?;

    let mut notes = Vec::with_capacity(records.len());
    let mut failures = Vec::new();
    let mut seen_ids = BTreeSet::new();

    for (index, raw) in records.iter().enumerate() {
        let outcome = Note::from_record(raw).and_then(|note| {
            if seen_ids.insert(note.id()) {
                Ok(note)
            } else {
                Err(vec![NoteValidationError::DuplicateId(note.id())])
            }
        });

        match outcome {
            Ok(note) => notes.push(note),
            Err(errors) => {
                warn!(
                    "event=note_validate module=extract status=error index={} errors={}",
                    index,
                    errors.len()
                );
                failures.push(RecordError {
                    index,
                    raw: raw.clone(),
                    errors,
                });
            }
        }
    }

    if !failures.is_empty() {
        return Err(NoteExtractionError::Validation(failures));
    }
    if notes.is_empty() {
        warn!("event=note_extract module=extract status=error error_code=empty_result");
        return Err(NoteExtractionError::EmptyResult);
    }

    let actual = notes.len();
    let warning = (actual != EXPECTED_NOTE_COUNT).then_some(CountWarning {
        expected: EXPECTED_NOTE_COUNT,
        actual,
    });
    if let Some(warning) = warning {
        warn!(
            "event=note_extract module=extract status=warn expected={} actual={}",
            warning.expected, warning.actual
        );
    }

    let batch = NoteBatch::from_unique_notes(notes);
    info!(
        "event=note_extract module=extract status=ok count={}",
        batch.len()
    );

    Ok(ExtractedNotes { batch, warning })
}

fn note_records(document: &Value) -> Result<&[Value], NoteExtractionError> {
    let Some(fields) = document.as_object() else {
        return Err(NoteExtractionError::Shape {
            detail: "top-level value must be a JSON object",
            attempted: document.to_string(),
        });
    };

    match fields.get("notes") {
        None => Ok(&[]),
        Some(Value::Array(records)) => Ok(records.as_slice()),
        Some(_) => Err(NoteExtractionError::Shape {
            detail: "`notes` must be an array",
            attempted: document.to_string(),
        }),
    }
}
