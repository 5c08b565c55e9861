//! Audit rows for lifecycle events.

use opsportal_core::types::EntityId;
use serde::Deserialize;

/// Input for inserting a lifecycle event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLifecycleEvent {
    pub event_type: String,
    pub aggregate_kind: Option<String>,
    pub aggregate_id: Option<EntityId>,
    pub actor_user_id: Option<String>,
    pub payload: serde_json::Value,
}
