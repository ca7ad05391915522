//! Application state.

use issuecast_core::{Dispatcher, GroupRegistry, IssueBroadcaster, IssueStore};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<GroupRegistry>,
    pub broadcaster: Arc<IssueBroadcaster>,
}

impl AppState {
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        let registry = Arc::new(GroupRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        Self {
            broadcaster: Arc::new(IssueBroadcaster::new(store, dispatcher)),
            registry,
        }
    }
}
