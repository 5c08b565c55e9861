//! Repository for the `lifecycle_events` table.

use sqlx::PgPool;

use crate::models::lifecycle_event::CreateLifecycleEvent;

/// Append-only writer for the lifecycle audit trail.
pub struct LifecycleEventRepo;

impl LifecycleEventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(pool: &PgPool, input: &CreateLifecycleEvent) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO lifecycle_events \
                (event_type, aggregate_kind, aggregate_id, actor_user_id, payload) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(&input.event_type)
        .bind(&input.aggregate_kind)
        .bind(input.aggregate_id)
        .bind(&input.actor_user_id)
        .bind(&input.payload)
        .fetch_one(pool)
        .await
    }
}
