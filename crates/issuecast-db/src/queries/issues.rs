//! Issue queries for realtime payloads.

use crate::pool::{DbPool, DbResult};
use rusqlite::{Connection, Row, ToSql};
use std::collections::HashMap;

/// Issue row with derived aggregates, as read at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRow {
    pub id: String,
    pub name: String,
    pub state_id: Option<String>,
    pub state_group: Option<String>,
    pub sort_order: f64,
    pub completed_at: Option<String>,
    pub estimate_point: Option<String>,
    pub priority: String,
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub sequence_id: i64,
    pub project_id: String,
    pub parent_id: Option<String>,
    pub cycle_id: Option<String>,
    pub module_ids: Vec<String>,
    pub label_ids: Vec<String>,
    pub assignee_ids: Vec<String>,
    pub sub_issues_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub attachment_count: i64,
    pub link_count: i64,
    pub is_draft: bool,
    pub archived_at: Option<String>,
    pub deleted_at: Option<String>,
}

/// Which issues a fetch may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueScope {
    /// Not deleted, archived or draft.
    #[default]
    Live,
    /// Like `Live`, but soft-deleted issues are returned too.
    IncludeDeleted,
}

impl IssueScope {
    fn filter(self) -> &'static str {
        match self {
            Self::Live => "i.deleted_at IS NULL AND i.archived_at IS NULL AND i.is_draft = 0",
            Self::IncludeDeleted => "i.archived_at IS NULL AND i.is_draft = 0",
        }
    }
}

/// `file_assets.entity_type` for files attached to an issue.
pub const ISSUE_ATTACHMENT: &str = "ISSUE_ATTACHMENT";

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_issue_row(row: &Row<'_>) -> rusqlite::Result<IssueRow> {
    Ok(IssueRow {
        id: row.get(0)?,
        name: row.get(1)?,
        state_id: row.get(2)?,
        state_group: row.get(3)?,
        sort_order: row.get(4)?,
        completed_at: row.get(5)?,
        estimate_point: row.get(6)?,
        priority: row.get(7)?,
        start_date: row.get(8)?,
        target_date: row.get(9)?,
        sequence_id: row.get(10)?,
        project_id: row.get(11)?,
        parent_id: row.get(12)?,
        cycle_id: row.get(13)?,
        module_ids: Vec::new(),
        label_ids: Vec::new(),
        assignee_ids: Vec::new(),
        sub_issues_count: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
        created_by: row.get(17)?,
        updated_by: row.get(18)?,
        attachment_count: row.get(19)?,
        link_count: row.get(20)?,
        is_draft: row.get(21)?,
        archived_at: row.get(22)?,
        deleted_at: row.get(23)?,
    })
}

/// Fetch issues of a project by id.
///
/// Issues outside the project or workspace, archived, still in draft or
/// (for [`IssueScope::Live`]) soft-deleted are left out without error.
/// Rows come back newest first.
pub fn fetch_issue_rows(
    pool: &DbPool,
    workspace_slug: &str,
    project_id: &str,
    issue_ids: &[String],
    scope: IssueScope,
) -> DbResult<Vec<IssueRow>> {
    if issue_ids.is_empty() {
        return Ok(Vec::new());
    }

    pool.with_conn(|conn| {
        let sql = format!(
            "SELECT i.id, i.name, i.state_id, s.\"group\", i.sort_order, i.completed_at,
                    i.estimate_point, i.priority, i.start_date, i.target_date, i.sequence_id,
                    i.project_id, i.parent_id,
                    (SELECT ci.cycle_id FROM cycle_issues ci
                      WHERE ci.issue_id = i.id AND ci.deleted_at IS NULL
                      ORDER BY ci.created_at, ci.rowid LIMIT 1) AS cycle_id,
                    (SELECT COUNT(*) FROM issues c
                      WHERE c.parent_id = i.id AND c.deleted_at IS NULL
                        AND c.archived_at IS NULL AND c.is_draft = 0) AS sub_issues_count,
                    i.created_at, i.updated_at, i.created_by, i.updated_by,
                    (SELECT COUNT(*) FROM file_assets fa
                      WHERE fa.issue_id = i.id AND fa.entity_type = '{attachment}'
                        AND fa.deleted_at IS NULL) AS attachment_count,
                    (SELECT COUNT(*) FROM issue_links l
                      WHERE l.issue_id = i.id AND l.deleted_at IS NULL) AS link_count,
                    i.is_draft, i.archived_at, i.deleted_at
             FROM issues i
             JOIN projects p ON p.id = i.project_id
             JOIN workspaces w ON w.id = p.workspace_id
             LEFT JOIN states s ON s.id = i.state_id
             WHERE i.project_id = ?1 AND w.slug = ?2
               AND i.id IN ({ids})
               AND {scope}
             ORDER BY i.created_at DESC",
            attachment = ISSUE_ATTACHMENT,
            scope = scope.filter(),
            ids = placeholders(3, issue_ids.len()),
        );

        let mut args: Vec<&dyn ToSql> = Vec::with_capacity(issue_ids.len() + 2);
        args.push(&project_id);
        args.push(&workspace_slug);
        args.extend(issue_ids.iter().map(|id| id as &dyn ToSql));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt
            .query_map(args.as_slice(), map_issue_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Ok(rows);
        }

        let found: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut modules = relation_ids(conn, "module_issues", "module_id", &found)?;
        let mut labels = relation_ids(conn, "issue_labels", "label_id", &found)?;
        let mut assignees = relation_ids(conn, "issue_assignees", "assignee_id", &found)?;

        for row in &mut rows {
            row.module_ids = modules.remove(&row.id).unwrap_or_default();
            row.label_ids = labels.remove(&row.id).unwrap_or_default();
            row.assignee_ids = assignees.remove(&row.id).unwrap_or_default();
        }

        Ok(rows)
    })
}

/// Non-deleted memberships of one relation table, grouped by issue and sorted.
fn relation_ids(
    conn: &Connection,
    table: &str,
    column: &str,
    issue_ids: &[String],
) -> DbResult<HashMap<String, Vec<String>>> {
    let sql = format!(
        "SELECT DISTINCT issue_id, {column} FROM {table}
         WHERE deleted_at IS NULL AND issue_id IN ({ids})
         ORDER BY issue_id, {column}",
        ids = placeholders(1, issue_ids.len()),
    );

    let mut stmt = conn.prepare(&sql)?;
    let pairs = stmt.query_map(rusqlite::params_from_iter(issue_ids.iter()), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for pair in pairs {
        let (issue_id, related_id) = pair?;
        grouped.entry(issue_id).or_default().push(related_id);
    }
    Ok(grouped)
}
