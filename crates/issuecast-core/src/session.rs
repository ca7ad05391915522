//! Per-connection lifecycle.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::registry::{
    ConnectionId, FrameReceiver, GroupKey, GroupRegistry, OUTBOUND_QUEUE_CAPACITY,
};

/// Connection state: `Connecting -> Joined -> Disconnected | ClosedOnError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Joined,
    Disconnected,
    ClosedOnError,
}

impl ConnectionState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Disconnected | Self::ClosedOnError)
    }
}

/// Drives one connection's group membership, independent of the transport.
///
/// The group is fixed when the handler is created, so leaving is always
/// possible even if joining never happened. Dropping the handler disconnects.
pub struct ConnectionHandler {
    id: ConnectionId,
    group: GroupKey,
    registry: Arc<GroupRegistry>,
    state: ConnectionState,
}

impl ConnectionHandler {
    pub fn new(registry: Arc<GroupRegistry>, project_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            group: GroupKey::for_project(project_id),
            registry,
            state: ConnectionState::Connecting,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn group(&self) -> &GroupKey {
        &self.group
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Join the project group and hand back the outbound frame queue.
    ///
    /// The queue holds [`OUTBOUND_QUEUE_CAPACITY`] frames; while it is full,
    /// new frames for this connection are dropped.
    pub fn connect(&mut self) -> CoreResult<FrameReceiver> {
        if self.state != ConnectionState::Connecting {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: ConnectionState::Joined,
            });
        }

        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.registry.join(&self.group, self.id, tx);
        self.state = ConnectionState::Joined;
        info!(group = %self.group, connection_id = %self.id, "Connection joined");
        Ok(rx)
    }

    /// Inbound client messages carry no commands; they are only logged.
    pub fn receive(&self, text: &str) {
        debug!(connection_id = %self.id, len = text.len(), "Ignoring inbound message");
    }

    /// Client-initiated close.
    pub fn disconnect(&mut self) {
        self.close(ConnectionState::Disconnected);
    }

    /// Transport failure.
    pub fn fail(&mut self) {
        self.close(ConnectionState::ClosedOnError);
    }

    fn close(&mut self, terminal: ConnectionState) {
        if self.state.is_closed() {
            return;
        }
        self.registry.leave(&self.group, self.id);
        info!(
            group = %self.group,
            connection_id = %self.id,
            state = ?terminal,
            "Connection closed"
        );
        self.state = terminal;
    }
}

impl Drop for ConnectionHandler {
    fn drop(&mut self) {
        self.disconnect();
    }
}
