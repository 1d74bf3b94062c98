use std::sync::Arc;

use spanbase_store::SpanStore;

/// Shared handler state. The store is the only shared mutable resource.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SpanStore>,
    /// Window size for recent-object listings.
    pub list_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn SpanStore>, list_limit: usize) -> Self {
        Self { store, list_limit }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("span_size", &self.store.span_size())
            .field("list_limit", &self.list_limit)
            .finish()
    }
}
