//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use opsportal_core::aggregate::AggregateKind;
use opsportal_core::types::{EmployeeId, EntityId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Something that happened to a project or sprint.
///
/// Built with [`LifecycleEvent::new`] and the `with_*` methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Dot-separated event name, e.g. `"project.status_changed"`.
    pub event_type: String,

    pub aggregate_kind: Option<AggregateKind>,
    pub aggregate_id: Option<EntityId>,

    /// The user the operation ran on behalf of.
    pub actor_user_id: Option<EmployeeId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            aggregate_kind: None,
            aggregate_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, kind: AggregateKind, id: EntityId) -> Self {
        self.aggregate_kind = Some(kind);
        self.aggregate_id = Some(id);
        self
    }

    pub fn with_actor(mut self, user_id: impl Into<EmployeeId>) -> Self {
        self.actor_user_id = Some(user_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Every subscriber independently receives every published event. When the
/// buffer is full the oldest events are dropped and slow receivers observe
/// `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Without subscribers the event is
    /// dropped.
    pub fn publish(&self, event: LifecycleEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsportal_core::types::new_id;

    #[tokio::test]
    async fn subscriber_receives_enriched_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let id = new_id();

        bus.publish(
            LifecycleEvent::new("project.status_changed")
                .with_source(AggregateKind::Project, id)
                .with_actor("U1")
                .with_payload(serde_json::json!({"to": "completed"})),
        );

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, "project.status_changed");
        assert_eq!(received.aggregate_kind, Some(AggregateKind::Project));
        assert_eq!(received.aggregate_id, Some(id));
        assert_eq!(received.actor_user_id.as_deref(), Some("U1"));
        assert_eq!(received.payload["to"], "completed");
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(LifecycleEvent::new("member.added"));

        assert_eq!(rx1.recv().await.unwrap().event_type, "member.added");
        assert_eq!(rx2.recv().await.unwrap().event_type, "member.added");
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..4 {
            bus.publish(LifecycleEvent::new(format!("event.{i}")));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(rx.recv().await.unwrap().event_type, "event.2");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        EventBus::default().publish(LifecycleEvent::new("orphan.event"));
    }
}
