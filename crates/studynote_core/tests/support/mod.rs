#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use studynote_core::{
    AssistantService, DocumentId, IndexBuild, IndexId, RemoteError, RemoteResource, RemoteResult,
    RemoteStatus, ResourceFilter, ResourceKind, RunOutcome, SessionConfig, SessionId,
};

/// Call recorded by the fake, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateSession(String),
    Upload { file_name: String, size: usize },
    BuildIndex { name: String, documents: Vec<String> },
    Bind { session: String, index: String },
    Submit { session: String, instructions: String, content: String },
    List(ResourceKind),
    Delete(ResourceKind, String),
}

/// Scripted in-memory `AssistantService`.
pub struct FakeAssistantService {
    pub calls: RefCell<Vec<Call>>,
    pub index_status: RemoteStatus,
    pub outcomes: RefCell<VecDeque<RemoteResult<RunOutcome>>>,
    pub resources: Vec<RemoteResource>,
    pub failing_deletes: Vec<String>,
}

impl Default for FakeAssistantService {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            index_status: RemoteStatus::Completed,
            outcomes: RefCell::new(VecDeque::new()),
            resources: Vec::new(),
            failing_deletes: Vec::new(),
        }
    }
}

impl FakeAssistantService {
    pub fn with_outcome(outcome: RemoteResult<RunOutcome>) -> Self {
        let fake = Self::default();
        fake.outcomes.borrow_mut().push_back(outcome);
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

pub fn completed_with_text(text: &str) -> RunOutcome {
    RunOutcome {
        status: RemoteStatus::Completed,
        text: Some(text.to_string()),
        citations: Vec::new(),
        document_search_used: true,
        last_error: None,
        steps: Vec::new(),
    }
}

pub fn failed_run(last_error: &str) -> RunOutcome {
    RunOutcome {
        status: RemoteStatus::Failed,
        text: None,
        citations: Vec::new(),
        document_search_used: false,
        last_error: Some(last_error.to_string()),
        steps: Vec::new(),
    }
}

pub fn resource(kind: ResourceKind, id: &str, name: &str, purpose: Option<&str>) -> RemoteResource {
    RemoteResource {
        id: id.to_string(),
        kind,
        name: name.to_string(),
        purpose: purpose.map(str::to_string),
    }
}

impl AssistantService for FakeAssistantService {
    fn create_session(&self, config: &SessionConfig) -> RemoteResult<SessionId> {
        self.record(Call::CreateSession(config.name.clone()));
        Ok(SessionId::new("asst_fake"))
    }

    fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> RemoteResult<DocumentId> {
        let count = self
            .calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::Upload { .. }))
            .count();
        self.record(Call::Upload {
            file_name: file_name.to_string(),
            size: bytes.len(),
        });
        Ok(DocumentId::new(format!("file_{}", count + 1)))
    }

    fn build_index(&self, name: &str, documents: &[DocumentId]) -> RemoteResult<IndexBuild> {
        self.record(Call::BuildIndex {
            name: name.to_string(),
            documents: documents.iter().map(|id| id.to_string()).collect(),
        });
        let total = documents.len() as u32;
        let completed = if self.index_status.is_success() { total } else { 0 };
        Ok(IndexBuild {
            index_id: IndexId::new("vs_fake"),
            status: self.index_status.clone(),
            completed,
            failed: total - completed,
            total,
        })
    }

    fn bind_index(&self, session: &SessionId, index: &IndexId) -> RemoteResult<()> {
        self.record(Call::Bind {
            session: session.to_string(),
            index: index.to_string(),
        });
        Ok(())
    }

    fn submit_request(
        &self,
        session: &SessionId,
        instructions: &str,
        content: &str,
    ) -> RemoteResult<RunOutcome> {
        self.record(Call::Submit {
            session: session.to_string(),
            instructions: instructions.to_string(),
            content: content.to_string(),
        });
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Network("no scripted outcome".to_string())))
    }

    fn list_resources(&self, filter: &ResourceFilter) -> RemoteResult<Vec<RemoteResource>> {
        self.record(Call::List(filter.kind));
        Ok(self
            .resources
            .iter()
            .filter(|resource| filter.matches(resource))
            .cloned()
            .collect())
    }

    fn delete_resource(&self, kind: ResourceKind, id: &str) -> RemoteResult<()> {
        self.record(Call::Delete(kind, id.to_string()));
        if self.failing_deletes.iter().any(|failing| failing == id) {
            return Err(RemoteError::Api {
                operation: "delete_resource",
                status: 404,
                body: "not found".to_string(),
            });
        }
        Ok(())
    }
}

/// Builds a `{"notes": [...]}` response with `count` valid notes.
pub fn notes_response(count: usize) -> String {
    let notes: Vec<serde_json::Value> = (1..=count)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "heading": format!("Concept {id}"),
                "summary": format!("Short summary of concept {id}."),
                "page_ref": if id % 2 == 0 { serde_json::Value::Null } else { serde_json::json!(id * 10) },
            })
        })
        .collect();
    serde_json::json!({ "notes": notes }).to_string()
}
