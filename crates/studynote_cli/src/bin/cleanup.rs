//! Deletes uploaded documents and study assistants.

use studynote_cli::{exit_with_error, finish_stage, start_stage};
use studynote_core::{default_filters, OpenAiAssistantService, TeardownService};

const STAGE: &str = "cleanup";

fn main() {
    let config = start_stage(STAGE);
    let service = match OpenAiAssistantService::from_config(&config) {
        Ok(service) => service,
        Err(err) => exit_with_error(STAGE, &err),
    };

    println!("Listing and deleting documents and assistants...");
    let report = match TeardownService::new(service).run(&default_filters()) {
        Ok(report) => report,
        Err(err) => exit_with_error(STAGE, &err),
    };

    for resource in &report.deleted {
        println!(
            "Deleted {}: {} (name={})",
            resource.kind.as_str(),
            resource.id,
            resource.name
        );
    }
    for (resource, err) in &report.failed {
        eprintln!(
            "Error deleting {} {}: {err}",
            resource.kind.as_str(),
            resource.id
        );
    }

    println!("Cleanup complete.");
    finish_stage(STAGE);
}
