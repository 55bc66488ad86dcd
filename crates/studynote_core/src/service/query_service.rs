//! Interactive question use-case.

use crate::query::classifier::{build_query_request, InstructionProfile};
use crate::remote::{AssistantService, Citation, RemoteResult, SessionId};
use log::info;

/// Answer to one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnswer {
    pub profile: InstructionProfile,
    /// `None` when the run completed without a text reply.
    pub text: Option<String>,
    pub citations: Vec<Citation>,
    pub document_search_used: bool,
}

pub struct QueryService<S: AssistantService> {
    service: S,
}

impl<S: AssistantService> QueryService<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Classifies the question, submits it and waits for the answer.
    ///
    /// A failed run is returned as an error so the caller can report it and
    /// move on to the next question.
    pub fn ask(&self, session: &SessionId, question: &str) -> RemoteResult<QueryAnswer> {
        let request = build_query_request(question);
        let outcome = self
            .service
            .submit_request(session, request.instructions, &request.content)?
            .ensure_completed("submit_request")?;

        info!(
            "event=query module=service status=ok profile={} citations={} document_search_used={}",
            request.profile.as_str(),
            outcome.citations.len(),
            outcome.document_search_used
        );
        Ok(QueryAnswer {
            profile: request.profile,
            text: outcome.text,
            citations: outcome.citations,
            document_search_used: outcome.document_search_used,
        })
    }
}
