//! Internal notification endpoints.

use axum::{extract::State, http::StatusCode, Json};
use issuecast_core::NotifyRequest;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;

/// Assemble the requested issues and broadcast them to the project's group.
///
/// Runs on the blocking pool since the store is synchronous.
pub async fn notify(
    State(state): State<AppState>,
    Json(request): Json<NotifyRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    info!(
        project_id = %request.project_id,
        issues = request.issue_ids.len(),
        kind = %request.event_kind,
        "Received internal notification"
    );

    let broadcaster = state.broadcaster.clone();
    let published = tokio::task::spawn_blocking(move || broadcaster.notify(&request))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            warn!(error = %e, "Failed to assemble issue payloads");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "published": published }))))
}
