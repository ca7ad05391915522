//! Issue snapshot sent in realtime events.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use chrono_tz::Tz;
use issuecast_db::queries::issues::IssueRow;
use serde::Serialize;
use tracing::warn;

use crate::error::{CoreError, CoreResult};

/// Keys of a serialized [`IssueSnapshot`], in wire order.
pub const SNAPSHOT_FIELDS: [&str; 27] = [
    "id",
    "name",
    "state_id",
    "state__group",
    "sort_order",
    "completed_at",
    "estimate_point",
    "priority",
    "start_date",
    "target_date",
    "sequence_id",
    "project_id",
    "parent_id",
    "cycle_id",
    "module_ids",
    "label_ids",
    "assignee_ids",
    "sub_issues_count",
    "created_at",
    "updated_at",
    "created_by",
    "updated_by",
    "attachment_count",
    "link_count",
    "is_draft",
    "archived_at",
    "deleted_at",
];

/// Flat, immutable view of one issue at broadcast time.
///
/// Every field serializes on every event; absent relations become `null`,
/// `0` or `[]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueSnapshot {
    pub id: String,
    pub name: String,
    pub state_id: Option<String>,
    #[serde(rename = "state__group")]
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

impl IssueSnapshot {
    /// Build a snapshot from a store row, localizing timestamps into `tz`.
    pub fn from_row(row: IssueRow, tz: Tz) -> CoreResult<Self> {
        Ok(Self {
            completed_at: localize_opt("completed_at", row.completed_at.as_deref(), tz)?,
            created_at: localize("created_at", &row.created_at, tz)?,
            updated_at: localize("updated_at", &row.updated_at, tz)?,
            deleted_at: localize_opt("deleted_at", row.deleted_at.as_deref(), tz)?,
            id: row.id,
            name: row.name,
            state_id: row.state_id,
            state_group: row.state_group,
            sort_order: row.sort_order,
            estimate_point: row.estimate_point,
            priority: row.priority,
            start_date: row.start_date,
            target_date: row.target_date,
            sequence_id: row.sequence_id,
            project_id: row.project_id,
            parent_id: row.parent_id,
            cycle_id: row.cycle_id,
            module_ids: row.module_ids,
            label_ids: row.label_ids,
            assignee_ids: row.assignee_ids,
            sub_issues_count: row.sub_issues_count,
            created_by: row.created_by,
            updated_by: row.updated_by,
            attachment_count: row.attachment_count,
            link_count: row.link_count,
            is_draft: row.is_draft,
            archived_at: row.archived_at,
        })
    }
}

/// Resolve an IANA timezone name. Missing or blank means UTC; an unknown
/// name is logged and also treated as UTC.
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    let name = match name.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return Tz::UTC,
    };
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(timezone = %name, "Unknown timezone, falling back to UTC");
            Tz::UTC
        }
    }
}

/// Parse a stored UTC timestamp: RFC 3339, or SQLite's `YYYY-MM-DD HH:MM:SS[.fff]`.
fn parse_stored(field: &'static str, value: &str) -> CoreResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

/// ISO 8601 in `tz`, truncated to milliseconds, with `Z` for a zero offset.
fn localize(field: &'static str, value: &str, tz: Tz) -> CoreResult<String> {
    let utc = parse_stored(field, value)?;
    Ok(utc
        .with_timezone(&tz)
        .trunc_subsecs(3)
        .to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn localize_opt(field: &'static str, value: Option<&str>, tz: Tz) -> CoreResult<Option<String>> {
    value.map(|v| localize(field, v, tz)).transpose()
}
