//! Generates validated exam revision notes from the indexed documents.

use studynote_cli::{exit_with_error, finish_stage, start_stage};
use studynote_core::{
    FileSessionRepository, JsonFileNoteBatchRepository, NotesService, OpenAiAssistantService,
    SessionRepository,
};

const STAGE: &str = "notes";

fn main() {
    let config = start_stage(STAGE);
    let session = match FileSessionRepository::new(config.session_file.clone()).load() {
        Ok(session) => session,
        Err(err) => exit_with_error(STAGE, &err),
    };
    let service = match OpenAiAssistantService::from_config(&config) {
        Ok(service) => service,
        Err(err) => exit_with_error(STAGE, &err),
    };
    let notes = NotesService::new(
        service,
        JsonFileNoteBatchRepository::new(config.notes_file.clone()),
    );

    println!("Requesting notes from assistant {session}...");
    let response = match notes.request_notes(&session) {
        Ok(response) => response,
        Err(err) => exit_with_error(STAGE, &err),
    };
    println!("Raw assistant response:\n{response}");

    match notes.save_notes(&response) {
        Ok(report) => {
            if let Some(warning) = report.warning {
                println!("Warning: {warning}");
            }
            println!(
                "Saved {} validated notes to {}",
                report.saved,
                config.notes_file.display()
            );
            finish_stage(STAGE);
        }
        Err(err) => exit_with_error(STAGE, &err),
    }
}
