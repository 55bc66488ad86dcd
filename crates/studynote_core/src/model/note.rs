//! Study note domain model.
//!
//! # Responsibility
//! - Define the validated `Note` record and the persisted `NoteBatch` shape.
//! - Validate raw JSON records field by field, collecting every failure.
//!
//! # Invariants
//! - A `Note` only exists after every field passed validation.
//! - `id` is within `[NOTE_ID_MIN, NOTE_ID_MAX]` and unique inside a batch.
//! - `summary` holds at most `SUMMARY_MAX_CHARS` characters.
//! - `page_ref` is either unknown (`None`) or a positive page number.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Smallest accepted note identifier.
pub const NOTE_ID_MIN: u8 = 1;
/// Largest accepted note identifier.
pub const NOTE_ID_MAX: u8 = 10;
/// Upper bound for `summary`, counted in characters.
pub const SUMMARY_MAX_CHARS: usize = 150;
/// Number of notes requested from the generation run.
pub const EXPECTED_NOTE_COUNT: usize = 10;

/// Field-level validation failure for one raw note record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// The record itself is not a JSON object.
    NotAnObject,
    /// A required field is absent.
    MissingField(&'static str),
    /// A field holds a value of the wrong JSON type.
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    /// `id` is an integer outside `[NOTE_ID_MIN, NOTE_ID_MAX]`.
    IdOutOfRange(String),
    /// `summary` exceeds `SUMMARY_MAX_CHARS`.
    SummaryTooLong { chars: usize },
    /// `page_ref` is an integer that is not a valid positive page number.
    InvalidPageRef(String),
    /// Another record of the same batch already uses this id.
    DuplicateId(u8),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "note record must be a JSON object"),
            Self::MissingField(field) => write!(f, "`{field}` is required"),
            Self::WrongType { field, expected } => {
                write!(f, "`{field}` must be {expected}")
            }
            Self::IdOutOfRange(value) => write!(
                f,
                "`id` must be between {NOTE_ID_MIN} and {NOTE_ID_MAX}, got {value}"
            ),
            Self::SummaryTooLong { chars } => write!(
                f,
                "`summary` must be at most {SUMMARY_MAX_CHARS} characters, got {chars}"
            ),
            Self::InvalidPageRef(value) => {
                write!(f, "`page_ref` must be a positive integer or null, got {value}")
            }
            Self::DuplicateId(id) => write!(f, "`id` {id} is used by an earlier note"),
        }
    }
}

impl Error for NoteValidationError {}

/// One validated revision note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Note {
    id: u8,
    heading: String,
    summary: String,
    page_ref: Option<u64>,
}

impl Note {
    /// Builds a note from already typed fields, applying the same rules as
    /// [`Note::from_record`].
    pub fn new(
        id: u8,
        heading: impl Into<String>,
        summary: impl Into<String>,
        page_ref: Option<u64>,
    ) -> Result<Self, Vec<NoteValidationError>> {
        let note = Self {
            id,
            heading: heading.into(),
            summary: summary.into(),
            page_ref,
        };

        let mut errors = Vec::new();
        if !(NOTE_ID_MIN..=NOTE_ID_MAX).contains(&note.id) {
            errors.push(NoteValidationError::IdOutOfRange(note.id.to_string()));
        }
        let chars = note.summary.chars().count();
        if chars > SUMMARY_MAX_CHARS {
            errors.push(NoteValidationError::SummaryTooLong { chars });
        }
        if note.page_ref == Some(0) {
            errors.push(NoteValidationError::InvalidPageRef("0".to_string()));
        }

        if errors.is_empty() {
            Ok(note)
        } else {
            Err(errors)
        }
    }

    /// Validates one raw JSON record and builds a note from it.
    ///
    /// Every field is checked even after the first failure, so the returned
    /// error list is complete. Unknown extra fields are ignored. A missing or
    /// `null` `page_ref` means the page is unknown.
    pub fn from_record(record: &Value) -> Result<Self, Vec<NoteValidationError>> {
        let Some(fields) = record.as_object() else {
            return Err(vec![NoteValidationError::NotAnObject]);
        };

        let mut errors = Vec::new();
        let id = collect(read_id(fields), &mut errors);
        let heading = collect(read_string(fields, "heading"), &mut errors);
        let summary = collect(read_summary(fields), &mut errors);
        let page_ref = collect(read_page_ref(fields), &mut errors);

        match (id, heading, summary, page_ref) {
            (Some(id), Some(heading), Some(summary), Some(page_ref)) if errors.is_empty() => {
                Ok(Self {
                    id,
                    heading,
                    summary,
                    page_ref,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Source page number, `None` when the page could not be identified.
    pub fn page_ref(&self) -> Option<u64> {
        self.page_ref
    }
}

impl TryFrom<Value> for Note {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_record(&value).map_err(|errors| join_errors(&errors))
    }
}

/// Ordered, persisted collection of validated notes.
///
/// Serialized as `{"notes": [...]}`; field order inside each note is fixed by
/// the `Note` declaration (`id`, `heading`, `summary`, `page_ref`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNoteBatch")]
pub struct NoteBatch {
    notes: Vec<Note>,
}

#[derive(Deserialize)]
struct RawNoteBatch {
    notes: Vec<Note>,
}

impl TryFrom<RawNoteBatch> for NoteBatch {
    type Error = NoteValidationError;

    fn try_from(value: RawNoteBatch) -> Result<Self, Self::Error> {
        Self::try_new(value.notes)
    }
}

impl NoteBatch {
    /// Builds a batch, rejecting duplicate note ids.
    pub fn try_new(notes: Vec<Note>) -> Result<Self, NoteValidationError> {
        let mut seen = BTreeSet::new();
        for note in &notes {
            if !seen.insert(note.id) {
                return Err(NoteValidationError::DuplicateId(note.id));
            }
        }
        Ok(Self { notes })
    }

    /// Wraps notes whose ids were already checked for uniqueness.
    pub(crate) fn from_unique_notes(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Joins validation messages into one line for display.
pub fn join_errors(errors: &[NoteValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn collect<T>(
    result: Result<T, NoteValidationError>,
    errors: &mut Vec<NoteValidationError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

fn read_id(fields: &Map<String, Value>) -> Result<u8, NoteValidationError> {
    let number = match fields.get("id") {
        None => return Err(NoteValidationError::MissingField("id")),
        Some(Value::Number(number)) if is_integer(number) => number,
        Some(_) => {
            return Err(NoteValidationError::WrongType {
                field: "id",
                expected: "an integer",
            })
        }
    };

    number
        .as_u64()
        .and_then(|value| u8::try_from(value).ok())
        .filter(|value| (NOTE_ID_MIN..=NOTE_ID_MAX).contains(value))
        .ok_or_else(|| NoteValidationError::IdOutOfRange(number.to_string()))
}

fn read_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<String, NoteValidationError> {
    match fields.get(field) {
        None => Err(NoteValidationError::MissingField(field)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(NoteValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn read_summary(fields: &Map<String, Value>) -> Result<String, NoteValidationError> {
    let summary = read_string(fields, "summary")?;
    let chars = summary.chars().count();
    if chars > SUMMARY_MAX_CHARS {
        return Err(NoteValidationError::SummaryTooLong { chars });
    }
    Ok(summary)
}

fn read_page_ref(fields: &Map<String, Value>) -> Result<Option<u64>, NoteValidationError> {
    let number = match fields.get("page_ref") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) if is_integer(number) => number,
        Some(_) => {
            return Err(NoteValidationError::WrongType {
                field: "page_ref",
                expected: "an integer or null",
            })
        }
    };

    number
        .as_u64()
        .filter(|value| *value >= 1)
        .map(Some)
        .ok_or_else(|| NoteValidationError::InvalidPageRef(number.to_string()))
}

fn is_integer(number: &Number) -> bool {
    number.is_i64() || number.is_u64()
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteValidationError};
    use serde_json::json;

    #[test]
    fn float_id_is_a_type_error_not_a_range_error() {
        let errors = Note::from_record(&json!({
            "id": 2.0, "heading": "h", "summary": "s"
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec![NoteValidationError::WrongType {
                field: "id",
                expected: "an integer",
            }]
        );
    }

    #[test]
    fn every_failing_field_is_reported() {
        let errors = Note::from_record(&json!({
            "id": 0, "summary": "x".repeat(151), "page_ref": "12"
        }))
        .unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&NoteValidationError::MissingField("heading")));
    }

    #[test]
    fn page_ref_accepts_any_positive_integer() {
        let note = Note::from_record(&json!({
            "id": 1, "heading": "h", "summary": "s", "page_ref": 5_000_000_000_u64
        }))
        .unwrap();
        assert_eq!(note.page_ref(), Some(5_000_000_000));
    }

    #[test]
    fn new_applies_record_rules() {
        assert!(Note::new(3, "Limits", "Definition of a limit", Some(12)).is_ok());
        let errors = Note::new(11, "h", "s", Some(0)).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
