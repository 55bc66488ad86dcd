use studynote_core::{
    FileSessionRepository, JsonFileNoteBatchRepository, Note, NoteBatch, NoteBatchRepoError,
    NoteBatchRepository, SessionId, SessionRepoError, SessionRepository,
};

#[test]
fn missing_session_marker_points_to_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileSessionRepository::new(dir.path().join(".assistant_id"));

    let err = repo.load().unwrap_err();
    assert!(matches!(err, SessionRepoError::Missing(_)));
    assert!(err.to_string().contains("studynote-bootstrap"));
}

#[test]
fn blank_session_marker_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".assistant_id");
    std::fs::write(&path, " \n").unwrap();

    let err = FileSessionRepository::new(&path).load().unwrap_err();
    assert!(matches!(err, SessionRepoError::Empty(_)));
}

#[test]
fn session_marker_round_trips_and_ignores_whitespace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".assistant_id");
    let repo = FileSessionRepository::new(&path);

    repo.save(&SessionId::new("asst_123")).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "asst_123");
    assert_eq!(repo.load().unwrap(), SessionId::new("asst_123"));

    std::fs::write(&path, "asst_456\n").unwrap();
    assert_eq!(repo.load().unwrap().as_str(), "asst_456");
}

fn sample_batch() -> NoteBatch {
    NoteBatch::try_new(vec![
        Note::new(1, "Limits", "Value a function approaches.", Some(4)).unwrap(),
        Note::new(2, "Derivatives", "Instantaneous rate of change.", None).unwrap(),
    ])
    .unwrap()
}

#[test]
fn saved_batch_is_indented_and_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exam_notes.json");
    let repo = JsonFileNoteBatchRepository::new(&path);

    repo.save(&sample_batch()).unwrap();

    let document = std::fs::read_to_string(&path).unwrap();
    assert!(document.starts_with("{\n  \"notes\": ["));
    assert!(document.contains("\"page_ref\": null"));
    assert!(document.ends_with("}\n"));
    assert!(!dir.path().join("exam_notes.json.tmp").exists());

    assert_eq!(repo.load().unwrap(), sample_batch());
}

#[test]
fn save_replaces_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exam_notes.json");
    std::fs::write(&path, "stale").unwrap();

    let repo = JsonFileNoteBatchRepository::new(&path);
    repo.save(&sample_batch()).unwrap();
    assert_eq!(repo.load().unwrap().len(), 2);
}

#[test]
fn invalid_persisted_notes_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exam_notes.json");
    std::fs::write(
        &path,
        r#"{"notes": [{"id": 1, "heading": "h", "summary": "s", "page_ref": 0}]}"#,
    )
    .unwrap();

    let err = JsonFileNoteBatchRepository::new(&path).load().unwrap_err();
    assert!(matches!(err, NoteBatchRepoError::InvalidData { .. }));
}

#[test]
fn save_into_missing_directory_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("exam_notes.json");

    let err = JsonFileNoteBatchRepository::new(&path)
        .save(&sample_batch())
        .unwrap_err();
    assert!(matches!(err, NoteBatchRepoError::Io { .. }));
    assert!(!path.exists());
}
