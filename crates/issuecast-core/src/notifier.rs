//! HTTP notifier for mutation services running in another process.
//!
//! Posts a [`NotifyRequest`] to a running issuecast server, which then
//! assembles and broadcasts the snapshots. Failures never reach the caller.

use std::time::Duration;
use tracing::{debug, warn};

use crate::envelope::EventKind;
use crate::notify::NotifyRequest;

/// Default issuecast server URL.
const DEFAULT_URL: &str = "http://127.0.0.1:3040";

/// Notifies the issuecast server of issue changes via HTTP.
#[derive(Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotifier {
    /// Create a notifier from `ISSUECAST_URL`, or `http://127.0.0.1:3040`.
    pub fn new() -> Self {
        let base_url = std::env::var("ISSUECAST_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::with_url(&base_url)
    }

    /// Create a notifier with a custom base URL.
    pub fn with_url(base_url: &str) -> Self {
        debug!(base_url = %base_url, "HttpNotifier initialized");
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/internal/notify", self.base_url)
    }

    /// Send a notification. Returns whether the server accepted it.
    pub async fn notify(&self, request: &NotifyRequest) -> bool {
        let url = self.endpoint();
        debug!(
            url = %url,
            project_id = %request.project_id,
            issues = request.issue_ids.len(),
            kind = %request.event_kind,
            "Sending issue notification"
        );

        match self.client.post(&url).json(request).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(project_id = %request.project_id, "Issue notification accepted");
                true
            }
            Ok(response) => {
                warn!(
                    project_id = %request.project_id,
                    status_code = %response.status(),
                    "Issue notification failed with status"
                );
                false
            }
            Err(e) => {
                // Expected when the server is not running.
                debug!(
                    project_id = %request.project_id,
                    error = %e,
                    url = %url,
                    "Failed to send issue notification (issuecast serve may not be running)"
                );
                false
            }
        }
    }

    /// Notify that issues were updated.
    pub async fn notify_issues_updated(
        &self,
        workspace_slug: &str,
        project_id: &str,
        issue_ids: &[String],
        timezone: Option<&str>,
    ) -> bool {
        let mut request = NotifyRequest::new(workspace_slug, project_id, issue_ids.iter().cloned())
            .with_kind(EventKind::ISSUE_UPDATED);
        request.timezone = timezone.map(str::to_string);
        self.notify(&request).await
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}
