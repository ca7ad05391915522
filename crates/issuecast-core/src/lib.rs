//! Issuecast Core Library
//!
//! Realtime fan-out of issue snapshots to project-scoped connections:
//! payload assembly, group membership, broadcast dispatch and the
//! per-connection lifecycle.

pub mod assembler;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod notifier;
pub mod notify;
pub mod registry;
pub mod session;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use assembler::{assemble, assemble_in_scope, IssueStore};
pub use dispatcher::Dispatcher;
pub use envelope::{Envelope, EventKind};
pub use error::{CoreError, CoreResult};
pub use notifier::HttpNotifier;
pub use notify::{IssueBroadcaster, NotifyRequest};
pub use registry::{
    ConnectionId, Frame, GroupKey, GroupRegistry, Member, OUTBOUND_QUEUE_CAPACITY,
};
pub use session::{ConnectionHandler, ConnectionState};
pub use snapshot::IssueSnapshot;
