//! Shared startup and exit handling for the stage binaries.
//!
//! # Responsibility
//! - Load configuration and start file logging before a stage runs.
//! - Print failures with their source chain and exit non-zero.
//! - Render the interactive prompt and answers of the ask stage.
//!
//! # Invariants
//! - A configuration error aborts before any remote call.
//! - A logging setup failure is reported but never blocks a stage.

use log::{error, info};
use std::error::Error;
use std::io::{self, Write};
use std::process;
use studynote_core::{default_log_level, init_logging, AppConfig, QueryAnswer};

/// Citations listed under an answer; the total count is always shown.
pub const MAX_PRINTED_CITATIONS: usize = 3;

/// Loads configuration and initializes logging for `stage`.
///
/// Exits the process with status 1 when configuration is invalid.
pub fn start_stage(stage: &'static str) -> AppConfig {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => exit_with_error(stage, &err),
    };

    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    if let Err(err) = init_logging(&level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    info!("event=stage_start module=cli status=ok stage={stage}");
    config
}

/// Prints `err` and every source to stderr, logs it and exits with status 1.
pub fn exit_with_error(stage: &'static str, err: &dyn Error) -> ! {
    eprintln!("{stage} failed: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }

    error!("event=stage_finish module=cli status=error stage={stage}");
    log::logger().flush();
    process::exit(1);
}

/// Logs a successful stage end.
pub fn finish_stage(stage: &'static str) {
    info!("event=stage_finish module=cli status=ok stage={stage}");
    log::logger().flush();
}

/// Writes `text` without a newline and flushes so the prompt is visible.
pub fn prompt<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Renders an answer, its first citations and the document search line.
pub fn render_answer(answer: &QueryAnswer) -> String {
    let mut rendered = String::from("Assistant Response:\n");
    rendered.push_str(answer.text.as_deref().unwrap_or("(no text response)"));
    rendered.push('\n');

    if !answer.citations.is_empty() {
        rendered.push_str(&format!(
            "\nCitations found: {}\n",
            answer.citations.len()
        ));
        for (position, citation) in answer
            .citations
            .iter()
            .take(MAX_PRINTED_CITATIONS)
            .enumerate()
        {
            rendered.push_str(&format!(
                "  {}. {} File: {}\n",
                position + 1,
                citation.marker,
                citation.document_id
            ));
        }
    }

    if answer.document_search_used {
        rendered.push_str("file_search tool was used\n");
    } else {
        rendered.push_str("file_search tool was not used\n");
    }
    rendered
}
