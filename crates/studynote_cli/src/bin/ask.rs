//! Interactive question loop against the bootstrapped assistant.

use std::io::{self, BufRead};
use studynote_cli::{exit_with_error, finish_stage, prompt, render_answer, start_stage};
use studynote_core::{
    core_version, is_exit_command, FileSessionRepository, OpenAiAssistantService, QueryService,
    SessionRepository,
};

const STAGE: &str = "ask";

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
    let queries = QueryService::new(service);

    println!(
        "Welcome to the Study Q&A Assistant (v{}). Type 'exit' to quit.",
        core_version()
    );
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        if let Err(err) = prompt(&mut io::stdout(), "\nYour question: ") {
            exit_with_error(STAGE, &err);
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => exit_with_error(STAGE, &err),
        }

        let question = line.trim();
        if is_exit_command(question) {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match queries.ask(&session, question) {
            Ok(answer) => print!("{}", render_answer(&answer)),
            Err(err) => eprintln!("Run failed: {err}"),
        }
    }

    println!("Goodbye!");
    finish_stage(STAGE);
}
