mod support;

use serde_json::json;
use studynote_core::{
    extract_notes, parse_response, strip_code_fences, NoteExtractionError, NoteValidationError,
    EXPECTED_NOTE_COUNT,
};
use support::notes_response;

#[test]
fn fenced_and_unfenced_responses_parse_identically() {
    let payload = notes_response(3);
    let direct: serde_json::Value = serde_json::from_str(&payload).unwrap();

    for wrapped in [
        format!("```json\n{payload}\n```"),
        format!("```\n{payload}\n```"),
        format!("  ```JSON\n\n{payload}  ```\n"),
        format!("\n{payload}\n"),
    ] {
        assert_eq!(parse_response(&wrapped).unwrap(), direct, "input: {wrapped}");
    }
}

#[test]
fn language_tag_is_removed_with_the_fence() {
    assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
    assert_eq!(strip_code_fences("```javascript {}```"), "{}");
}

#[test]
fn invalid_json_fails_with_attempted_text() {
    let err = extract_notes("```json\n{\"notes\": [ {\"id\": 1,, }\n```").unwrap_err();
    match err {
        NoteExtractionError::Parse { attempted, .. } => {
            assert_eq!(attempted, "{\"notes\": [ {\"id\": 1,, }");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn prose_around_json_is_not_repaired() {
    let response = format!("Here are your notes:\n{}", notes_response(2));
    assert!(matches!(
        extract_notes(&response),
        Err(NoteExtractionError::Parse { .. })
    ));
}

#[test]
fn ten_valid_notes_produce_no_warning() {
    let extracted = extract_notes(&notes_response(10)).unwrap();
    assert_eq!(extracted.batch.len(), EXPECTED_NOTE_COUNT);
    assert_eq!(extracted.warning, None);
}

#[test]
fn three_valid_notes_produce_a_shortfall_warning() {
    let extracted = extract_notes(&notes_response(3)).unwrap();
    assert_eq!(extracted.batch.len(), 3);
    let warning = extracted.warning.unwrap();
    assert_eq!((warning.expected, warning.actual), (10, 3));
    assert!(warning.to_string().contains("received 3"));
}

#[test]
fn notes_keep_response_order() {
    let response = json!({"notes": [
        {"id": 7, "heading": "g", "summary": "g"},
        {"id": 2, "heading": "b", "summary": "b"}
    ]})
    .to_string();
    let extracted = extract_notes(&response).unwrap();
    let ids: Vec<u8> = extracted.batch.notes().iter().map(|note| note.id()).collect();
    assert_eq!(ids, vec![7, 2]);
}

fn single_invalid_batch(bad: serde_json::Value) -> Vec<studynote_core::RecordError> {
    let mut notes: Vec<serde_json::Value> = (1..=4)
        .map(|id| json!({"id": id, "heading": "h", "summary": "s", "page_ref": 3}))
        .collect();
    notes.insert(2, bad);
    let response = json!({ "notes": notes }).to_string();

    match extract_notes(&response).unwrap_err() {
        NoteExtractionError::Validation(records) => records,
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn one_invalid_id_rejects_the_whole_batch() {
    let records = single_invalid_batch(json!({"id": 11, "heading": "h", "summary": "s"}));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].index, 2);
    assert_eq!(
        records[0].errors,
        vec![NoteValidationError::IdOutOfRange("11".to_string())]
    );
}

#[test]
fn one_long_summary_rejects_the_whole_batch() {
    let records = single_invalid_batch(json!({
        "id": 9, "heading": "h", "summary": "x".repeat(151)
    }));
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].errors,
        vec![NoteValidationError::SummaryTooLong { chars: 151 }]
    );
}

#[test]
fn one_non_integer_page_ref_rejects_the_whole_batch() {
    let records = single_invalid_batch(json!({
        "id": 9, "heading": "h", "summary": "s", "page_ref": "page 4"
    }));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].index, 2);
}

#[test]
fn validation_error_names_every_failing_record() {
    let response = json!({"notes": [
        {"id": 0, "heading": "h", "summary": "s"},
        {"id": 2, "heading": "h", "summary": "s"},
        {"id": 3, "summary": "s", "page_ref": 0}
    ]})
    .to_string();

    let err = extract_notes(&response).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("2 note(s) failed validation"));
    assert!(message.contains("note #0"));
    assert!(message.contains("note #2"));
    assert!(!message.contains("note #1"));
}

#[test]
fn missing_notes_key_is_an_empty_result() {
    assert!(matches!(
        extract_notes("{\"summary\": \"I could not find any material.\"}"),
        Err(NoteExtractionError::EmptyResult)
    ));
}

#[test]
fn empty_notes_array_is_an_empty_result() {
    assert!(matches!(
        extract_notes("```json\n{\"notes\": []}\n```"),
        Err(NoteExtractionError::EmptyResult)
    ));
}
