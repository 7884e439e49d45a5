//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::dashboard::Dashboard;

/// Shared application state.
///
/// One dashboard serves every request; requests touching it are serialized.
pub struct AppState<P, S, N> {
    pub dashboard: Arc<Mutex<Dashboard<P, S, N>>>,
}

impl<P, S, N> AppState<P, S, N> {
    /// Create a new app state.
    pub fn new(dashboard: Dashboard<P, S, N>) -> Self {
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
        }
    }
}

// Derived Clone would require the type parameters to be Clone.
impl<P, S, N> Clone for AppState<P, S, N> {
    fn clone(&self) -> Self {
        Self {
            dashboard: Arc::clone(&self.dashboard),
        }
    }
}
