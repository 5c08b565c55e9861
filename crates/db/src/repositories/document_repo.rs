//! [`EntityStore`] over the `projects` and `sprints` tables.
//!
//! Each aggregate is one row: the JSONB document plus a version counter that
//! every write increments. Conditional updates match on the version the
//! caller read; array appends run in a single `UPDATE` without a version
//! check.

use async_trait::async_trait;
use opsportal_core::aggregate::AggregateKind;
use opsportal_core::store::{Document, EntityStore, StoreError};
use opsportal_core::types::{EntityId, Version};
use serde_json::Value;
use sqlx::PgPool;

use crate::models::document::DocumentRow;

/// Column list for document queries.
const COLUMNS: &str = "id, department, doc, version, created_at, updated_at";

fn table(kind: AggregateKind) -> &'static str {
    match kind {
        AggregateKind::Project => "projects",
        AggregateKind::Sprint => "sprints",
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Entity store query failed");
    StoreError::Unavailable(err.to_string())
}

#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, kind: AggregateKind, id: EntityId) -> Result<bool, StoreError> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table(kind));
        sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn get(&self, kind: AggregateKind, id: EntityId) -> Result<Option<Document>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", table(kind));
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(row.map(Document::from))
    }

    async fn create(
        &self,
        kind: AggregateKind,
        id: EntityId,
        department: &str,
        body: Value,
    ) -> Result<Document, StoreError> {
        let query = format!(
            "INSERT INTO {} (id, department, doc, version) VALUES ($1, $2, $3, 1) \
             ON CONFLICT (id) DO NOTHING \
             RETURNING {COLUMNS}",
            table(kind)
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .bind(department)
            .bind(&body)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(Document::from)
            .ok_or(StoreError::Duplicate { kind, id })
    }

    async fn update(
        &self,
        kind: AggregateKind,
        id: EntityId,
        expected: Version,
        body: Value,
    ) -> Result<Document, StoreError> {
        let query = format!(
            "UPDATE {} SET doc = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $2 \
             RETURNING {COLUMNS}",
            table(kind)
        );
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .bind(expected)
            .bind(&body)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        match row {
            Some(row) => Ok(row.into()),
            None if self.exists(kind, id).await? => {
                Err(StoreError::VersionConflict { kind, id, expected })
            }
            None => Err(StoreError::NotFound { kind, id }),
        }
    }

    async fn append(
        &self,
        kind: AggregateKind,
        id: EntityId,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        let query = format!(
            "UPDATE {} SET \
                doc = jsonb_set(doc, ARRAY[$2::text], \
                    COALESCE(doc->$2, '[]'::jsonb) || jsonb_build_array($3::jsonb)), \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}",
            table(kind)
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .bind(field)
            .bind(&value)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(Document::from)
            .ok_or(StoreError::NotFound { kind, id })
    }

    async fn list(
        &self,
        kind: AggregateKind,
        department: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM {} \
             WHERE ($1::text IS NULL OR department = $1) \
             ORDER BY created_at DESC",
            table(kind)
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(department)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(unavailable)
    }
}
