//! Entry point for mutation paths: assemble, then broadcast.

use issuecast_db::queries::issues::IssueScope;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::assembler::{assemble_in_scope, IssueStore};
use crate::dispatcher::Dispatcher;
use crate::envelope::{Envelope, EventKind};
use crate::error::CoreResult;
use crate::registry::GroupKey;

/// A request to broadcast the current state of some issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub workspace_slug: String,
    pub project_id: String,
    #[serde(default)]
    pub issue_ids: Vec<Option<String>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub event_kind: EventKind,
}

impl NotifyRequest {
    pub fn new<I, T>(workspace_slug: &str, project_id: &str, issue_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            workspace_slug: workspace_slug.to_string(),
            project_id: project_id.to_string(),
            issue_ids: issue_ids.into_iter().map(|id| Some(id.into())).collect(),
            timezone: None,
            event_kind: EventKind::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.event_kind = kind;
        self
    }
}

/// Reads issue snapshots and publishes them to the project's group.
pub struct IssueBroadcaster {
    store: Arc<dyn IssueStore>,
    dispatcher: Dispatcher,
}

impl IssueBroadcaster {
    pub fn new(store: Arc<dyn IssueStore>, dispatcher: Dispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Publish one envelope per found issue; returns how many were published.
    ///
    /// `issue.deleted` events also read soft-deleted issues, so clients get
    /// the final snapshot with `deleted_at` set.
    ///
    /// Store errors are returned because no valid event exists without a
    /// successful read. Delivery problems are never returned.
    pub fn notify(&self, request: &NotifyRequest) -> CoreResult<usize> {
        let scope = if request.event_kind == EventKind::ISSUE_DELETED {
            IssueScope::IncludeDeleted
        } else {
            IssueScope::Live
        };
        let snapshots = assemble_in_scope(
            self.store.as_ref(),
            &request.workspace_slug,
            &request.project_id,
            request.issue_ids.iter().flatten(),
            request.timezone.as_deref(),
            scope,
        )?;

        let key = GroupKey::for_project(&request.project_id);
        for snapshot in &snapshots {
            self.dispatcher
                .publish(&key, &Envelope::new(request.event_kind.clone(), snapshot));
        }

        debug!(
            group = %key,
            kind = %request.event_kind,
            published = snapshots.len(),
            "Broadcast issue updates"
        );
        Ok(snapshots.len())
    }
}
