//! Durable audit trail for lifecycle events.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every event to `lifecycle_events`. It runs as a long-lived
//! background task and stops when the bus is dropped.

use opsportal_db::models::lifecycle_event::CreateLifecycleEvent;
use opsportal_db::repositories::LifecycleEventRepo;
use opsportal_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::LifecycleEvent;

pub struct EventPersistence;

impl EventPersistence {
    /// Persist events from `receiver` until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<LifecycleEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = LifecycleEventRepo::insert(&pool, &Self::to_row(&event)).await
                    {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist lifecycle event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Row for `event`. The timestamp becomes the payload's `occurred_at`.
    pub fn to_row(event: &LifecycleEvent) -> CreateLifecycleEvent {
        let mut payload = event.payload.clone();
        if let Some(object) = payload.as_object_mut() {
            object.insert(
                "occurred_at".to_string(),
                serde_json::Value::String(event.timestamp.to_rfc3339()),
            );
        }
        CreateLifecycleEvent {
            event_type: event.event_type.clone(),
            aggregate_kind: event.aggregate_kind.map(|k| k.as_str().to_string()),
            aggregate_id: event.aggregate_id,
            actor_user_id: event.actor_user_id.clone(),
            payload,
        }
    }
}
