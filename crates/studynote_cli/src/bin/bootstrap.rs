//! Creates the study assistant, uploads documents and builds its index.

use studynote_cli::{exit_with_error, finish_stage, start_stage};
use studynote_core::{
    BootstrapPlan, BootstrapReport, BootstrapService, FileSessionRepository, OpenAiAssistantService,
    StageError,
};

const STAGE: &str = "bootstrap";

fn main() {
    let config = start_stage(STAGE);
    let plan = BootstrapPlan::from_config(&config);
    let sessions = FileSessionRepository::new(config.session_file.clone());

    let report = OpenAiAssistantService::from_config(&config)
        .map_err(StageError::from)
        .and_then(|service| BootstrapService::new(service, sessions).run(&plan));

    match report {
        Ok(report) => {
            print_report(&report, &config.session_file.display().to_string());
            finish_stage(STAGE);
        }
        Err(err) => exit_with_error(STAGE, &err),
    }
}

fn print_report(report: &BootstrapReport, session_file: &str) {
    println!("Created assistant with ID: {}", report.session_id);
    for document in &report.documents {
        println!(
            "Uploaded {} -> document id: {}",
            document.path.display(),
            document.document_id
        );
    }
    println!("Index created: {}", report.index.index_id);
    println!("Index build status: {}", report.index.status);
    println!(
        "Files processed: {}/{}",
        report.index.completed, report.index.total
    );
    println!("Assistant updated with document search resources.");
    println!("Saved assistant ID to {session_file}");
}
