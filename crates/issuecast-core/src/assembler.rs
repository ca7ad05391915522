//! Payload assembly: issue ids in, localized snapshots out.

use issuecast_db::queries::issues::{self, IssueRow, IssueScope};
use issuecast_db::{DbPool, DbResult};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::CoreResult;
use crate::snapshot::{resolve_timezone, IssueSnapshot};

/// Read side of the issue store used by the assembler.
pub trait IssueStore: Send + Sync {
    /// Issues of `project_id` in `workspace_slug` whose id is in `issue_ids`.
    fn fetch_issue_rows(
        &self,
        workspace_slug: &str,
        project_id: &str,
        issue_ids: &[String],
        scope: IssueScope,
    ) -> DbResult<Vec<IssueRow>>;
}

impl IssueStore for DbPool {
    fn fetch_issue_rows(
        &self,
        workspace_slug: &str,
        project_id: &str,
        issue_ids: &[String],
        scope: IssueScope,
    ) -> DbResult<Vec<IssueRow>> {
        issues::fetch_issue_rows(self, workspace_slug, project_id, issue_ids, scope)
    }
}

/// Assemble snapshots for the given live issues.
///
/// Ids are de-duplicated and blank ones dropped; with nothing left the store
/// is not touched. Ids the store does not return are skipped silently, and
/// the store's ordering is kept. Store errors propagate.
pub fn assemble<S, I, T>(
    store: &S,
    workspace_slug: &str,
    project_id: &str,
    issue_ids: I,
    timezone: Option<&str>,
) -> CoreResult<Vec<IssueSnapshot>>
where
    S: IssueStore + ?Sized,
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    assemble_in_scope(
        store,
        workspace_slug,
        project_id,
        issue_ids,
        timezone,
        IssueScope::Live,
    )
}

/// [`assemble`] with an explicit store scope.
pub fn assemble_in_scope<S, I, T>(
    store: &S,
    workspace_slug: &str,
    project_id: &str,
    issue_ids: I,
    timezone: Option<&str>,
    scope: IssueScope,
) -> CoreResult<Vec<IssueSnapshot>>
where
    S: IssueStore + ?Sized,
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let ids: Vec<String> = issue_ids
        .into_iter()
        .map(|id| id.as_ref().to_string())
        .filter(|id| !id.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = store.fetch_issue_rows(workspace_slug, project_id, &ids, scope)?;
    debug!(
        project_id = %project_id,
        requested = ids.len(),
        found = rows.len(),
        "Fetched issue rows for realtime payloads"
    );

    let tz = resolve_timezone(timezone);
    rows.into_iter()
        .map(|row| IssueSnapshot::from_row(row, tz))
        .collect()
}
