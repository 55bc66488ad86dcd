//! Bootstrap use-case: create the remote session and its document index.
//!
//! # Responsibility
//! - Read source documents, upload them, build and bind the index.
//! - Persist the new session id for later stages.
//!
//! # Invariants
//! - All documents are read before any remote resource is created.
//! - The session id is persisted only after the index is bound.

use crate::config::AppConfig;
use crate::remote::{AssistantService, DocumentId, IndexBuild, SessionConfig, SessionId};
use crate::repo::session_repo::SessionRepository;
use crate::service::StageError;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// What the bootstrap stage creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    pub session: SessionConfig,
    pub documents: Vec<PathBuf>,
    pub index_name: String,
}

impl BootstrapPlan {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            session: SessionConfig::study_assistant(config.model.clone()),
            documents: config.documents.clone(),
            index_name: config.index_name.clone(),
        }
    }
}

/// Uploaded document paired with its remote id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub path: PathBuf,
    pub document_id: DocumentId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub session_id: SessionId,
    pub documents: Vec<UploadedDocument>,
    pub index: IndexBuild,
}

pub struct BootstrapService<S: AssistantService, R: SessionRepository> {
    service: S,
    sessions: R,
}

impl<S: AssistantService, R: SessionRepository> BootstrapService<S, R> {
    pub fn new(service: S, sessions: R) -> Self {
        Self { service, sessions }
    }

    /// Runs every bootstrap step in order, aborting on the first failure.
    pub fn run(&self, plan: &BootstrapPlan) -> Result<BootstrapReport, StageError> {
        let started_at = Instant::now();
        let sources = plan
            .documents
            .iter()
            .map(|path| {
                std::fs::read(path)
                    .map(|bytes| (path.clone(), bytes))
                    .map_err(|source| StageError::Document {
                        path: path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let session_id = self.service.create_session(&plan.session)?;

        let mut documents = Vec::with_capacity(sources.len());
        for (path, bytes) in sources {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let document_id = self.service.upload_document(&file_name, bytes)?;
            documents.push(UploadedDocument { path, document_id });
        }

        let document_ids: Vec<DocumentId> = documents
            .iter()
            .map(|document| document.document_id.clone())
            .collect();
        let index = self
            .service
            .build_index(&plan.index_name, &document_ids)?
            .ensure_completed()?;

        self.service.bind_index(&session_id, &index.index_id)?;
        self.sessions.save(&session_id)?;

        info!(
            "event=bootstrap module=service status=ok documents={} duration_ms={}",
            documents.len(),
            started_at.elapsed().as_millis()
        );
        Ok(BootstrapReport {
            session_id,
            documents,
            index,
        })
    }
}
