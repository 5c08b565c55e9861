//! Lifecycle event bus and audit persistence.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`LifecycleEvent`]: the event envelope published after each successful
//!   mutation.
//! - [`EventPersistence`]: background task that writes every event to the
//!   `lifecycle_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, LifecycleEvent};
pub use persistence::EventPersistence;
