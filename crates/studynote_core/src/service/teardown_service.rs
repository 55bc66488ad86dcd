//! Teardown use-case: remove resources created by earlier stages.
//!
//! # Invariants
//! - Listing failures abort teardown.
//! - A failed delete is recorded and teardown continues with the next resource.

use crate::remote::{
    AssistantService, RemoteError, RemoteResource, RemoteResult, ResourceFilter, ResourceKind,
};
use log::{info, warn};

/// Purpose carried by documents uploaded for assistant use.
pub const DOCUMENT_PURPOSE: &str = "assistants";
/// Name fragment shared by every session the bootstrap stage creates.
pub const SESSION_NAME_FRAGMENT: &str = "study q&a";

#[derive(Debug, Default)]
pub struct TeardownReport {
    pub deleted: Vec<RemoteResource>,
    pub failed: Vec<(RemoteResource, RemoteError)>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Filters selecting resources owned by this workspace, in deletion order.
pub fn default_filters() -> Vec<ResourceFilter> {
    vec![
        ResourceFilter::kind(ResourceKind::Document).purpose(DOCUMENT_PURPOSE),
        ResourceFilter::kind(ResourceKind::Session).name_contains(SESSION_NAME_FRAGMENT),
    ]
}

pub struct TeardownService<S: AssistantService> {
    service: S,
}

impl<S: AssistantService> TeardownService<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn run(&self, filters: &[ResourceFilter]) -> RemoteResult<TeardownReport> {
        let mut report = TeardownReport::default();

        for filter in filters {
            for resource in self.service.list_resources(filter)? {
                match self.service.delete_resource(resource.kind, &resource.id) {
                    Ok(()) => {
                        info!(
                            "event=resource_delete module=service status=ok kind={} id={}",
                            resource.kind.as_str(),
                            resource.id
                        );
                        report.deleted.push(resource);
                    }
                    Err(err) => {
                        warn!(
                            "event=resource_delete module=service status=error kind={} id={} error={}",
                            resource.kind.as_str(),
                            resource.id,
                            err
                        );
                        report.failed.push((resource, err));
                    }
                }
            }
        }

        Ok(report)
    }
}
