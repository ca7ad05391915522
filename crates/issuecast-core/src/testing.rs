//! Shared fixtures for unit tests.

use issuecast_db::migrations::run_migrations;
use issuecast_db::queries::issues::{IssueRow, IssueScope};
use issuecast_db::{DbError, DbPool, DbResult};
use std::sync::Mutex;

use crate::assembler::IssueStore;

/// Workspace `acme` with project `42` holding `issue_7` (child, link,
/// attachment, label, cycle) and the bare `issue_8`, plus `issue_elsewhere`
/// in project `43`.
pub fn seeded_pool() -> DbPool {
    let pool = DbPool::in_memory().unwrap();
    run_migrations(&pool).unwrap();
    pool.with_conn(|conn| {
        conn.execute_batch(
            "INSERT INTO workspaces (id, slug) VALUES ('w1', 'acme');
             INSERT INTO projects (id, workspace_id) VALUES ('42', 'w1'), ('43', 'w1');
             INSERT INTO states (id, project_id, name, \"group\") VALUES ('todo', '42', 'Todo', 'unstarted');
             INSERT INTO issues (id, project_id, state_id, name, priority, sequence_id, created_at, updated_at, created_by)
                 VALUES ('issue_7', '42', 'todo', 'Fix login', 'high', 7,
                         '2024-03-01T12:00:00Z', '2024-03-02T08:30:00Z', 'user-1');
             INSERT INTO issues (id, project_id, name, sequence_id, created_at, updated_at)
                 VALUES ('issue_8', '42', 'Write docs', 8, '2024-03-03T12:00:00Z', '2024-03-03T12:00:00Z');
             INSERT INTO issues (id, project_id, parent_id, name, sequence_id, created_at, updated_at)
                 VALUES ('issue_9', '42', 'issue_7', 'Subtask', 9, '2024-02-01T12:00:00Z', '2024-02-01T12:00:00Z');
             INSERT INTO issues (id, project_id, name, sequence_id, created_at, updated_at)
                 VALUES ('issue_elsewhere', '43', 'Other project', 1, '2024-03-01T12:00:00Z', '2024-03-01T12:00:00Z');
             INSERT INTO cycle_issues (id, cycle_id, issue_id) VALUES ('ci1', 'cycle-1', 'issue_7');
             INSERT INTO issue_labels (id, label_id, issue_id) VALUES ('il1', 'bug', 'issue_7');
             INSERT INTO issue_links (id, issue_id, url) VALUES ('lk1', 'issue_7', 'https://example.com');
             INSERT INTO file_assets (id, issue_id, entity_type) VALUES ('fa1', 'issue_7', 'ISSUE_ATTACHMENT');",
        )?;
        Ok(())
    })
    .unwrap();
    pool
}

/// Store wrapper that records how it was called.
pub struct CountingStore {
    inner: DbPool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl CountingStore {
    pub fn new(inner: DbPool) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_ids(&self) -> Vec<String> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl IssueStore for CountingStore {
    fn fetch_issue_rows(
        &self,
        workspace_slug: &str,
        project_id: &str,
        issue_ids: &[String],
        scope: IssueScope,
    ) -> DbResult<Vec<IssueRow>> {
        self.calls.lock().unwrap().push(issue_ids.to_vec());
        self.inner.fetch_issue_rows(workspace_slug, project_id, issue_ids, scope)
    }
}

/// Store whose every read fails.
pub struct FailingStore;

impl IssueStore for FailingStore {
    fn fetch_issue_rows(
        &self,
        _: &str,
        _: &str,
        _: &[String],
        _: IssueScope,
    ) -> DbResult<Vec<IssueRow>> {
        Err(DbError::Lock)
    }
}
