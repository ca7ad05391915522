//! Wire envelope sent to websocket clients.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Event discriminator carried in the envelope's `type` key.
///
/// Any string is accepted so new kinds can be published without a release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKind(Cow<'static, str>);

impl EventKind {
    pub const ISSUE_CREATED: EventKind = EventKind(Cow::Borrowed("issue.created"));
    pub const ISSUE_UPDATED: EventKind = EventKind(Cow::Borrowed("issue.updated"));
    pub const ISSUE_DELETED: EventKind = EventKind(Cow::Borrowed("issue.deleted"));

    pub fn new(kind: impl Into<String>) -> Self {
        Self(Cow::Owned(kind.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventKind {
    fn default() -> Self {
        Self::ISSUE_UPDATED
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{"type": <kind>, "data": <payload>}`, nothing else at the top level.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(kind: EventKind, data: T) -> Self {
        Self { kind, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_has_exactly_two_keys() {
        let envelope = Envelope::new(EventKind::ISSUE_UPDATED, json!({"id": "issue_7"}));
        let value = serde_json::to_value(&envelope).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(value["type"], "issue.updated");
        assert_eq!(value["data"]["id"], "issue_7");
    }

    #[test]
    fn test_list_payload() {
        let envelope = Envelope::new(EventKind::new("issue.bulk_updated"), vec![json!({}), json!({})]);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "issue.bulk_updated");
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_event_kind_roundtrips_as_plain_string() {
        let kind: EventKind = serde_json::from_str("\"issue.created\"").unwrap();
        assert_eq!(kind, EventKind::ISSUE_CREATED);
        assert_eq!(EventKind::default().as_str(), "issue.updated");
    }
}
