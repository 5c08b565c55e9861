//! HTTP handlers, one per exposed lifecycle operation.
//!
//! Every mutating handler publishes a [`LifecycleEvent`] after the engine
//! call succeeds.
//!
//! [`LifecycleEvent`]: opsportal_events::LifecycleEvent

pub mod aggregate;
pub mod attachment;
pub mod deliverable;
pub mod project;
pub mod sprint;

use serde::Deserialize;

/// Request body for every status-change endpoint.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest<S> {
    pub status: S,
}

/// Request body for endpoints that take a single free-text message.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}
