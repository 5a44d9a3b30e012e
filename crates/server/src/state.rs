//! Shared axum handler state: one `Arc<Coordinator>` per process.

use codecortex_registry::Coordinator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}
