//! Project-scoped group membership.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Identifier of one live connection.
pub type ConnectionId = Uuid;

/// A serialized envelope, shared by every member it is delivered to.
pub type Frame = Arc<str>;

/// Frames a connection may have waiting before new ones are dropped for it.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Sending half of a connection's outbound queue.
pub type FrameSender = mpsc::Sender<Frame>;

/// Receiving half of a connection's outbound queue.
pub type FrameReceiver = mpsc::Receiver<Frame>;

/// Why a frame could not be queued for a member.
pub type DeliveryError = mpsc::error::TrySendError<Frame>;

/// Name of a project's group: `project_<project_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn for_project(project_id: &str) -> Self {
        Self(format!("project_{}", project_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A group member as seen at enumeration time.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: ConnectionId,
    tx: FrameSender,
}

impl Member {
    /// Queue a frame for this member without waiting.
    ///
    /// Fails if the connection is gone or its queue is full.
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.tx.try_send(frame)
    }
}

/// Which connections belong to which group.
///
/// Empty groups are evicted as soon as their last member leaves.
#[derive(Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<GroupKey, HashMap<ConnectionId, FrameSender>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a group. Returns `false` if it was already a member,
    /// in which case the existing queue is kept.
    pub fn join(&self, key: &GroupKey, id: ConnectionId, tx: FrameSender) -> bool {
        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        let members = groups.entry(key.clone()).or_default();
        if members.contains_key(&id) {
            return false;
        }
        members.insert(id, tx);
        debug!(group = %key, connection_id = %id, members = members.len(), "Joined group");
        true
    }

    /// Remove a connection from a group. Returns `false` if it was not a member.
    pub fn leave(&self, key: &GroupKey, id: ConnectionId) -> bool {
        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        let Some(members) = groups.get_mut(key) else {
            return false;
        };
        let removed = members.remove(&id).is_some();
        let remaining = members.len();
        if remaining == 0 {
            groups.remove(key);
        }
        if removed {
            debug!(group = %key, connection_id = %id, members = remaining, "Left group");
        }
        removed
    }

    /// Snapshot of a group's members. Unknown groups are empty.
    pub fn members(&self, key: &GroupKey) -> Vec<Member> {
        let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
        groups
            .get(key)
            .map(|members| {
                members
                    .iter()
                    .map(|(id, tx)| Member {
                        id: *id,
                        tx: tx.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn member_ids(&self, key: &GroupKey) -> HashSet<ConnectionId> {
        self.members(key).into_iter().map(|m| m.id).collect()
    }

    /// Number of groups with at least one member.
    pub fn group_count(&self) -> usize {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
