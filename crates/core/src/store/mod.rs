//! Entity Store collaborator.
//!
//! Aggregates are stored as opaque JSON documents with a version counter.
//! Every write is conditional on the version the writer read, except
//! [`EntityStore::append`], which pushes onto an array field atomically.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::aggregate::AggregateKind;
use crate::error::CoreError;
use crate::types::{EntityId, Version};

pub use memory::MemoryStore;

/// One stored aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: EntityId,
    pub department: String,
    /// Bumped by the store on every successful write.
    pub version: Version,
    pub body: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{} {id} was modified concurrently (expected version {expected})", .kind.as_str())]
    VersionConflict {
        kind: AggregateKind,
        id: EntityId,
        expected: Version,
    },

    #[error("{} {id} not found", .kind.entity_name())]
    NotFound { kind: AggregateKind, id: EntityId },

    #[error("{} {id} already exists", .kind.entity_name())]
    Duplicate { kind: AggregateKind, id: EntityId },

    #[error("entity store unavailable: {0}")]
    Unavailable(String),

    #[error("stored document is malformed: {0}")]
    Serialization(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { .. } | StoreError::Duplicate { .. } => {
                CoreError::Conflict(err.to_string())
            }
            StoreError::NotFound { kind, id } => CoreError::not_found(kind.entity_name(), id),
            StoreError::Unavailable(msg) => CoreError::DependencyUnavailable(msg),
            StoreError::Serialization(msg) => CoreError::Internal(msg),
        }
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, kind: AggregateKind, id: EntityId) -> Result<Option<Document>, StoreError>;

    /// Insert a new document at version 1.
    async fn create(
        &self,
        kind: AggregateKind,
        id: EntityId,
        department: &str,
        body: Value,
    ) -> Result<Document, StoreError>;

    /// Replace the body if the stored version still equals `expected`.
    async fn update(
        &self,
        kind: AggregateKind,
        id: EntityId,
        expected: Version,
        body: Value,
    ) -> Result<Document, StoreError>;

    /// Push `value` onto the array at top-level `field`, regardless of version.
    async fn append(
        &self,
        kind: AggregateKind,
        id: EntityId,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError>;

    /// All documents of `kind`, optionally restricted to one department.
    async fn list(
        &self,
        kind: AggregateKind,
        department: Option<&str>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}
