//! OpenAI Assistants v2 implementation of `AssistantService`.
//!
//! # Responsibility
//! - Map the service capability set onto assistants, files, vector stores,
//!   threads, runs, run steps and messages endpoints.
//! - Poll index builds and runs to a terminal status with `PollPolicy`.
//!
//! # Invariants
//! - The API key is only ever sent as a bearer header, never logged.
//! - Every remote call emits one `remote_call` event with duration and status.

use super::poll::{wait_until, PollError, PollPolicy};
use super::{
    AssistantService, Citation, DocumentId, IndexBuild, IndexId, RemoteError, RemoteResource,
    RemoteResult, RemoteStatus, ResourceFilter, ResourceKind, RunOutcome, RunStep, SessionConfig,
    SessionId,
};
use crate::config::AppConfig;
use log::{debug, error, info, warn};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

/// Public OpenAI REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_HEADER_VALUE: &str = "assistants=v2";
const DOCUMENT_PURPOSE: &str = "assistants";
const DOCUMENT_SEARCH_TOOL: &str = "file_search";
const LIST_LIMIT: &str = "100";
const RUN_DETAIL_LIMIT: &str = "20";

/// Blocking OpenAI Assistants client.
pub struct OpenAiAssistantService {
    http: Client,
    api_key: String,
    base_url: String,
    poll: PollPolicy,
    request_timeout: Duration,
}

impl OpenAiAssistantService {
    /// `request_timeout` bounds each HTTP call, document uploads included.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        poll: PollPolicy,
        request_timeout: Duration,
    ) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| RemoteError::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll,
            request_timeout,
        })
    }

    /// Uses the configured poll bound both for polling and per request.
    pub fn from_config(config: &AppConfig) -> RemoteResult<Self> {
        let service = Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            PollPolicy::default().with_max_wait(config.poll_timeout),
            config.poll_timeout,
        )?;
        debug!(
            "event=client_init module=remote status=ok base_url={} request_timeout_s={}",
            service.base_url,
            service.request_timeout.as_secs()
        );
        Ok(service)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_HEADER_VALUE)
    }

    fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> RemoteResult<T> {
        let started_at = Instant::now();
        let response = builder.send().map_err(|err| {
            error!(
                "event=remote_call module=remote status=error op={} duration_ms={} error_code=network error={}",
                operation,
                started_at.elapsed().as_millis(),
                err
            );
            RemoteError::Network(err.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(
                "event=remote_call module=remote status=error op={} duration_ms={} http_status={}",
                operation,
                started_at.elapsed().as_millis(),
                status.as_u16()
            );
            return Err(RemoteError::Api {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        let decoded = response
            .json::<T>()
            .map_err(|err| RemoteError::Decode(format!("{operation}: {err}")))?;
        debug!(
            "event=remote_call module=remote status=ok op={} duration_ms={}",
            operation,
            started_at.elapsed().as_millis()
        );
        Ok(decoded)
    }

    fn poll<T, F, P>(&self, operation: &'static str, fetch: F, is_terminal: P) -> RemoteResult<T>
    where
        F: FnMut() -> RemoteResult<T>,
        P: Fn(&T) -> bool,
    {
        wait_until(&self.poll, fetch, is_terminal).map_err(|err| match err {
            PollError::Source(source) => source,
            PollError::TimedOut { attempts, waited } => {
                warn!(
                    "event=remote_poll module=remote status=timeout op={} attempts={} waited_ms={}",
                    operation,
                    attempts,
                    waited.as_millis()
                );
                RemoteError::Timeout { operation, waited }
            }
        })
    }

    fn run_messages(&self, thread_id: &str) -> RemoteResult<Vec<WireMessage>> {
        let list: WireList<WireMessage> = self.send(
            "list_messages",
            self.request(Method::GET, &format!("threads/{thread_id}/messages"))
                .query(&[("order", "desc"), ("limit", RUN_DETAIL_LIMIT)]),
        )?;
        Ok(list.data)
    }

    fn run_steps(&self, thread_id: &str, run_id: &str) -> RemoteResult<Vec<WireRunStep>> {
        let list: WireList<WireRunStep> = self.send(
            "list_run_steps",
            self.request(
                Method::GET,
                &format!("threads/{thread_id}/runs/{run_id}/steps"),
            )
            .query(&[("limit", RUN_DETAIL_LIMIT)]),
        )?;
        Ok(list.data)
    }
}

impl AssistantService for OpenAiAssistantService {
    fn create_session(&self, config: &SessionConfig) -> RemoteResult<SessionId> {
        let tools = if config.document_search {
            json!([{ "type": DOCUMENT_SEARCH_TOOL }])
        } else {
            json!([])
        };
        let created: WireObject = self.send(
            "create_session",
            self.request(Method::POST, "assistants").json(&json!({
                "name": config.name,
                "instructions": config.instructions,
                "model": config.model,
                "tools": tools,
            })),
        )?;

        info!(
            "event=session_create module=remote status=ok session_id={}",
            created.id
        );
        Ok(SessionId::new(created.id))
    }

    fn upload_document(&self, file_name: &str, bytes: Vec<u8>) -> RemoteResult<DocumentId> {
        let size = bytes.len();
        let form = Form::new()
            .text("purpose", DOCUMENT_PURPOSE)
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let uploaded: WireObject = self.send(
            "upload_document",
            self.request(Method::POST, "files").multipart(form),
        )?;

        info!(
            "event=document_upload module=remote status=ok document_id={} bytes={}",
            uploaded.id, size
        );
        Ok(DocumentId::new(uploaded.id))
    }

    fn build_index(&self, name: &str, documents: &[DocumentId]) -> RemoteResult<IndexBuild> {
        let store: WireObject = self.send(
            "create_index",
            self.request(Method::POST, "vector_stores")
                .json(&json!({ "name": name })),
        )?;
        let file_ids: Vec<&str> = documents.iter().map(DocumentId::as_str).collect();
        let batch: WireFileBatch = self.send(
            "create_index_batch",
            self.request(
                Method::POST,
                &format!("vector_stores/{}/file_batches", store.id),
            )
            .json(&json!({ "file_ids": file_ids })),
        )?;

        let batch_path = format!("vector_stores/{}/file_batches/{}", store.id, batch.id);
        let finished = if RemoteStatus::parse(&batch.status).is_terminal() {
            batch
        } else {
            self.poll(
                "build_index",
                || self.send("poll_index_batch", self.request(Method::GET, &batch_path)),
                |current: &WireFileBatch| RemoteStatus::parse(&current.status).is_terminal(),
            )?
        };

        let build = index_build_from_wire(IndexId::new(store.id), &finished);
        info!(
            "event=index_build module=remote status={} index_id={} completed={} total={}",
            build.status, build.index_id, build.completed, build.total
        );
        Ok(build)
    }

    fn bind_index(&self, session: &SessionId, index: &IndexId) -> RemoteResult<()> {
        let _: WireObject = self.send(
            "bind_index",
            self.request(Method::POST, &format!("assistants/{session}"))
                .json(&json!({
                    "tool_resources": {
                        "file_search": { "vector_store_ids": [index.as_str()] }
                    }
                })),
        )?;
        Ok(())
    }

    fn submit_request(
        &self,
        session: &SessionId,
        instructions: &str,
        content: &str,
    ) -> RemoteResult<RunOutcome> {
        let thread: WireObject = self.send(
            "create_thread",
            self.request(Method::POST, "threads").json(&json!({
                "messages": [{ "role": "user", "content": content }]
            })),
        )?;
        let run: WireRun = self.send(
            "create_run",
            self.request(Method::POST, &format!("threads/{}/runs", thread.id))
                .json(&json!({
                    "assistant_id": session.as_str(),
                    "instructions": instructions,
                })),
        )?;

        let run_path = format!("threads/{}/runs/{}", thread.id, run.id);
        let finished = if RemoteStatus::parse(&run.status).is_terminal() {
            run
        } else {
            self.poll(
                "submit_request",
                || self.send("poll_run", self.request(Method::GET, &run_path)),
                |current: &WireRun| RemoteStatus::parse(&current.status).is_terminal(),
            )?
        };

        let status = RemoteStatus::parse(&finished.status);
        let messages = if status.is_success() {
            self.run_messages(&thread.id)?
        } else {
            Vec::new()
        };
        let steps = self.run_steps(&thread.id, &finished.id)?;

        info!(
            "event=run_finish module=remote status={} run_id={} steps={}",
            status,
            finished.id,
            steps.len()
        );
        Ok(run_outcome_from_wire(&finished, &messages, &steps))
    }

    fn list_resources(&self, filter: &ResourceFilter) -> RemoteResult<Vec<RemoteResource>> {
        let resources: Vec<RemoteResource> = match filter.kind {
            ResourceKind::Session => {
                let list: WireList<WireAssistant> = self.send(
                    "list_sessions",
                    self.request(Method::GET, "assistants")
                        .query(&[("limit", LIST_LIMIT)]),
                )?;
                list.data
                    .into_iter()
                    .map(|assistant| RemoteResource {
                        id: assistant.id,
                        kind: ResourceKind::Session,
                        name: assistant.name.unwrap_or_default(),
                        purpose: None,
                    })
                    .collect()
            }
            ResourceKind::Document => {
                let list: WireList<WireFile> =
                    self.send("list_documents", self.request(Method::GET, "files"))?;
                list.data
                    .into_iter()
                    .map(|file| RemoteResource {
                        id: file.id,
                        kind: ResourceKind::Document,
                        name: file.filename,
                        purpose: Some(file.purpose),
                    })
                    .collect()
            }
        };

        Ok(resources
            .into_iter()
            .filter(|resource| filter.matches(resource))
            .collect())
    }

    fn delete_resource(&self, kind: ResourceKind, id: &str) -> RemoteResult<()> {
        let path = match kind {
            ResourceKind::Session => format!("assistants/{id}"),
            ResourceKind::Document => format!("files/{id}"),
        };
        let deleted: WireDeleted =
            self.send("delete_resource", self.request(Method::DELETE, &path))?;
        if !deleted.deleted {
            return Err(RemoteError::OperationFailed {
                operation: "delete_resource",
                status: "not_deleted".to_string(),
                detail: Some(format!("{} {id}", kind.as_str())),
            });
        }
        Ok(())
    }
}

fn index_build_from_wire(index_id: IndexId, batch: &WireFileBatch) -> IndexBuild {
    IndexBuild {
        index_id,
        status: RemoteStatus::parse(&batch.status),
        completed: batch.file_counts.completed,
        failed: batch.file_counts.failed,
        total: batch.file_counts.total,
    }
}

fn run_outcome_from_wire(
    run: &WireRun,
    messages: &[WireMessage],
    steps: &[WireRunStep],
) -> RunOutcome {
    let answer = messages
        .iter()
        .filter(|message| message.role == "assistant")
        .find_map(|message| {
            message.content.iter().find_map(|content| match content {
                WireContent::Text { text } => Some(text),
                WireContent::Other => None,
            })
        });

    let citations = answer
        .map(|text| {
            text.annotations
                .iter()
                .filter_map(|annotation| {
                    annotation.file_citation.as_ref().map(|citation| Citation {
                        document_id: DocumentId::new(citation.file_id.clone()),
                        marker: annotation.text.clone(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let document_search_used = steps.iter().any(|step| {
        step.kind == "tool_calls"
            && step.step_details.as_ref().is_some_and(|details| {
                details
                    .tool_calls
                    .iter()
                    .any(|call| call.kind == DOCUMENT_SEARCH_TOOL)
            })
    });

    RunOutcome {
        status: RemoteStatus::parse(&run.status),
        text: answer.map(|text| text.value.clone()),
        citations,
        document_search_used,
        last_error: run.last_error.as_ref().map(WireLastError::describe),
        steps: steps
            .iter()
            .map(|step| RunStep {
                id: step.id.clone(),
                kind: step.kind.clone(),
                status: RemoteStatus::parse(&step.status),
                last_error: step.last_error.as_ref().map(WireLastError::describe),
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
struct WireObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireDeleted {
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct WireList<T> {
    data: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct WireFileCounts {
    #[serde(default)]
    completed: u32,
    #[serde(default)]
    failed: u32,
    #[serde(default)]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct WireFileBatch {
    id: String,
    status: String,
    #[serde(default)]
    file_counts: WireFileCounts,
}

#[derive(Debug, Deserialize)]
struct WireLastError {
    code: Option<String>,
    message: Option<String>,
}

impl WireLastError {
    fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireRun {
    id: String,
    status: String,
    last_error: Option<WireLastError>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text { text: WireText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
    #[serde(default)]
    annotations: Vec<WireAnnotation>,
}

#[derive(Debug, Deserialize)]
struct WireAnnotation {
    #[serde(default)]
    text: String,
    file_citation: Option<WireFileCitation>,
}

#[derive(Debug, Deserialize)]
struct WireFileCitation {
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct WireRunStep {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    status: String,
    step_details: Option<WireStepDetails>,
    last_error: Option<WireLastError>,
}

#[derive(Debug, Deserialize)]
struct WireStepDetails {
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct WireAssistant {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    id: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    purpose: String,
}

#[cfg(test)]
mod tests {
    use super::{
        index_build_from_wire, run_outcome_from_wire, OpenAiAssistantService, WireFileBatch,
        WireList, WireMessage, WireRun, WireRunStep,
    };
    use crate::config::AppConfig;
    use crate::remote::poll::PollPolicy;
    use crate::remote::{IndexId, RemoteStatus};
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;

    fn messages(value: serde_json::Value) -> Vec<WireMessage> {
        serde_json::from_value::<WireList<WireMessage>>(value)
            .unwrap()
            .data
    }

    fn steps(value: serde_json::Value) -> Vec<WireRunStep> {
        serde_json::from_value::<WireList<WireRunStep>>(value)
            .unwrap()
            .data
    }

    #[test]
    fn completed_run_picks_newest_assistant_text_and_citations() {
        let run: WireRun =
            serde_json::from_value(json!({"id": "run_1", "status": "completed", "last_error": null}))
                .unwrap();
        let messages = messages(json!({"data": [
            {"role": "assistant", "content": [
                {"type": "image_file", "image_file": {"file_id": "img"}},
                {"type": "text", "text": {
                    "value": "A limit is... [1]",
                    "annotations": [
                        {"type": "file_citation", "text": "[1]",
                         "file_citation": {"file_id": "file_pdf"}},
                        {"type": "file_path", "text": "[2]",
                         "file_path": {"file_id": "file_out"}}
                    ]
                }}
            ]},
            {"role": "user", "content": [{"type": "text", "text": {"value": "question"}}]}
        ]}));
        let steps = steps(json!({"data": [
            {"id": "step_1", "type": "tool_calls", "status": "completed",
             "step_details": {"type": "tool_calls", "tool_calls": [{"id": "c", "type": "file_search"}]},
             "last_error": null},
            {"id": "step_2", "type": "message_creation", "status": "completed",
             "step_details": {"type": "message_creation"}, "last_error": null}
        ]}));

        let outcome = run_outcome_from_wire(&run, &messages, &steps);
        assert_eq!(outcome.status, RemoteStatus::Completed);
        assert_eq!(outcome.text.as_deref(), Some("A limit is... [1]"));
        assert_eq!(outcome.citations.len(), 1);
        assert_eq!(outcome.citations[0].document_id.as_str(), "file_pdf");
        assert_eq!(outcome.citations[0].marker, "[1]");
        assert!(outcome.document_search_used);
        assert_eq!(outcome.steps.len(), 2);
    }

    #[test]
    fn failed_run_carries_last_error_and_step_errors() {
        let run: WireRun = serde_json::from_value(json!({
            "id": "run_2", "status": "failed",
            "last_error": {"code": "rate_limit_exceeded", "message": "slow down"}
        }))
        .unwrap();
        let steps = steps(json!({"data": [
            {"id": "step_1", "type": "tool_calls", "status": "failed",
             "step_details": {"type": "tool_calls", "tool_calls": []},
             "last_error": {"code": "server_error", "message": null}}
        ]}));

        let outcome = run_outcome_from_wire(&run, &[], &steps);
        assert_eq!(outcome.status, RemoteStatus::Failed);
        assert_eq!(
            outcome.last_error.as_deref(),
            Some("rate_limit_exceeded: slow down")
        );
        assert!(outcome.text.is_none());
        assert!(!outcome.document_search_used);
        assert_eq!(outcome.steps[0].last_error.as_deref(), Some("server_error"));
    }

    #[test]
    fn index_build_reads_file_counts() {
        let batch: WireFileBatch = serde_json::from_value(json!({
            "id": "vsfb_1", "status": "completed",
            "file_counts": {"in_progress": 0, "completed": 1, "failed": 0, "cancelled": 0, "total": 1}
        }))
        .unwrap();
        let build = index_build_from_wire(IndexId::new("vs_1"), &batch);
        assert_eq!(build.status, RemoteStatus::Completed);
        assert_eq!((build.completed, build.total), (1, 1));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let service = OpenAiAssistantService::new(
            "sk-test",
            "http://localhost:8080/v1/",
            PollPolicy::default(),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(service.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn request_timeout_follows_configured_poll_bound() {
        let config = AppConfig::from_lookup(Path::new("/work"), |key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "STUDYNOTE_POLL_TIMEOUT_SECS" => Some("900".to_string()),
            _ => None,
        })
        .unwrap();
        let service = OpenAiAssistantService::from_config(&config).unwrap();
        assert_eq!(service.request_timeout(), Duration::from_secs(900));
    }
}
