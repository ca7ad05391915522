//! Broadcast dispatcher: fan one envelope out to a group.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::CoreResult;
use crate::registry::{DeliveryError, Frame, GroupKey, GroupRegistry};

/// Publishes envelopes to every current member of a group.
///
/// Delivery is best effort: members enumerated at publish time get one copy
/// pushed onto their own ordered queue, nothing is retried or kept for later.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<GroupRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<GroupRegistry>) -> Self {
        Self { registry }
    }

    /// Serialize once and queue the frame for each member.
    ///
    /// Returns how many members accepted the frame. A member whose connection
    /// has already gone, or whose queue is full, misses this frame without
    /// affecting the others. Publishing never waits on a member.
    pub fn try_publish<T: Serialize>(
        &self,
        key: &GroupKey,
        envelope: &Envelope<T>,
    ) -> CoreResult<usize> {
        let frame: Frame = serde_json::to_string(envelope)?.into();

        let members = self.registry.members(key);
        let mut delivered = 0;
        for member in &members {
            match member.deliver(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Full(_)) => {
                    warn!(group = %key, connection_id = %member.id, "Outbound queue full, frame dropped");
                }
                Err(DeliveryError::Closed(_)) => {
                    debug!(group = %key, connection_id = %member.id, "Delivery skipped, connection closed");
                }
            }
        }

        debug!(
            group = %key,
            kind = %envelope.kind,
            members = members.len(),
            delivered,
            "Published envelope"
        );
        Ok(delivered)
    }

    /// Fire-and-forget publish. Failures are logged and never reach the caller.
    pub fn publish<T: Serialize>(&self, key: &GroupKey, envelope: &Envelope<T>) {
        if let Err(e) = self.try_publish(key, envelope) {
            warn!(group = %key, kind = %envelope.kind, error = %e, "Abandoned publish");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EventKind;
    use crate::error::CoreError;
    use serde::ser::Error as _;
    use serde_json::json;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("not JSON-safe"))
        }
    }

    fn setup(n: usize) -> (Dispatcher, GroupKey, Vec<mpsc::Receiver<Frame>>) {
        let registry = Arc::new(GroupRegistry::new());
        let key = GroupKey::for_project("42");
        let receivers = (0..n)
            .map(|_| {
                let (tx, rx) = mpsc::channel(8);
                registry.join(&key, Uuid::new_v4(), tx);
                rx
            })
            .collect();
        (Dispatcher::new(registry), key, receivers)
    }

    #[test]
    fn test_every_member_gets_one_copy() {
        let (dispatcher, key, mut receivers) = setup(3);
        let envelope = Envelope::new(EventKind::ISSUE_UPDATED, json!({"id": "issue_7"}));

        assert_eq!(dispatcher.try_publish(&key, &envelope).unwrap(), 3);
        for rx in &mut receivers {
            let frame = rx.try_recv().unwrap();
            assert_eq!(&*frame, r#"{"type":"issue.updated","data":{"id":"issue_7"}}"#);
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_failed_member_does_not_block_others() {
        let (dispatcher, key, mut receivers) = setup(3);
        drop(receivers.remove(1));
        let envelope = Envelope::new(EventKind::ISSUE_UPDATED, json!({"id": "issue_7"}));

        assert_eq!(dispatcher.try_publish(&key, &envelope).unwrap(), 2);
        for rx in &mut receivers {
            assert!(rx.try_recv().is_ok());
        }
    }

    #[test]
    fn test_full_member_does_not_block_others() {
        let registry = Arc::new(GroupRegistry::new());
        let key = GroupKey::for_project("42");
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        registry.join(&key, Uuid::new_v4(), slow_tx);
        registry.join(&key, Uuid::new_v4(), fast_tx);
        let dispatcher = Dispatcher::new(registry);

        let first = Envelope::new(EventKind::ISSUE_UPDATED, json!({"seq": 1}));
        let second = Envelope::new(EventKind::ISSUE_UPDATED, json!({"seq": 2}));
        assert_eq!(dispatcher.try_publish(&key, &first).unwrap(), 2);
        assert_eq!(dispatcher.try_publish(&key, &second).unwrap(), 1);

        assert!(fast_rx.try_recv().unwrap().contains(r#""seq":1"#));
        assert!(fast_rx.try_recv().unwrap().contains(r#""seq":2"#));
        assert!(slow_rx.try_recv().unwrap().contains(r#""seq":1"#));
        assert!(slow_rx.try_recv().is_err());
    }

    #[test]
    fn test_per_member_order() {
        let (dispatcher, key, mut receivers) = setup(2);
        dispatcher.publish(&key, &Envelope::new(EventKind::ISSUE_UPDATED, json!({"seq": 1})));
        dispatcher.publish(&key, &Envelope::new(EventKind::ISSUE_UPDATED, json!({"seq": 2})));

        for rx in &mut receivers {
            let first: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
            let second: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
            assert_eq!(first["data"]["seq"], 1);
            assert_eq!(second["data"]["seq"], 2);
        }
    }

    #[test]
    fn test_serialization_failure_abandons_publish() {
        let (dispatcher, key, mut receivers) = setup(2);
        let envelope = Envelope::new(EventKind::ISSUE_UPDATED, Unserializable);

        assert!(matches!(
            dispatcher.try_publish(&key, &envelope),
            Err(CoreError::Json(_))
        ));
        dispatcher.publish(&key, &envelope);
        for rx in &mut receivers {
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_empty_group() {
        let (dispatcher, _, _) = setup(0);
        let envelope = Envelope::new(EventKind::ISSUE_UPDATED, json!({}));
        assert_eq!(
            dispatcher
                .try_publish(&GroupKey::for_project("nobody"), &envelope)
                .unwrap(),
            0
        );
    }
}
