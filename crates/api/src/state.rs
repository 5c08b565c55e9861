use std::sync::Arc;

use opsportal_core::engine::LifecycleEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Every lifecycle operation, wired to the entity store and directory.
    pub engine: Arc<LifecycleEngine>,
    pub config: Arc<ServerConfig>,
    /// Lifecycle events are published here after each successful mutation.
    pub event_bus: Arc<opsportal_events::EventBus>,
}
