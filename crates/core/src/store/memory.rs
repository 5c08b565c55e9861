//! In-process [`EntityStore`] backed by a `HashMap`.
//!
//! Used by the engine and API tests, and by the server when no database is
//! configured for local experiments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, EntityStore, StoreError};
use crate::aggregate::AggregateKind;
use crate::types::{EntityId, Version};

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(AggregateKind, EntityId), Document>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, kind: AggregateKind, id: EntityId) -> Result<Option<Document>, StoreError> {
        self.check_available()?;
        Ok(self.documents.read().await.get(&(kind, id)).cloned())
    }

    async fn create(
        &self,
        kind: AggregateKind,
        id: EntityId,
        department: &str,
        body: Value,
    ) -> Result<Document, StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().await;
        if documents.contains_key(&(kind, id)) {
            return Err(StoreError::Duplicate { kind, id });
        }
        let doc = Document {
            id,
            department: department.to_string(),
            version: 1,
            body,
        };
        documents.insert((kind, id), doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        kind: AggregateKind,
        id: EntityId,
        expected: Version,
        body: Value,
    ) -> Result<Document, StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().await;
        let doc = documents
            .get_mut(&(kind, id))
            .ok_or(StoreError::NotFound { kind, id })?;
        if doc.version != expected {
            return Err(StoreError::VersionConflict { kind, id, expected });
        }
        doc.body = body;
        doc.version += 1;
        Ok(doc.clone())
    }

    async fn append(
        &self,
        kind: AggregateKind,
        id: EntityId,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().await;
        let doc = documents
            .get_mut(&(kind, id))
            .ok_or(StoreError::NotFound { kind, id })?;
        let object = doc
            .body
            .as_object_mut()
            .ok_or_else(|| StoreError::Serialization(format!("{} {id} is not an object", kind.as_str())))?;
        match object
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => items.push(value),
            _ => {
                return Err(StoreError::Serialization(format!(
                    "field {field} of {} {id} is not an array",
                    kind.as_str()
                )))
            }
        }
        doc.version += 1;
        Ok(doc.clone())
    }

    async fn list(
        &self,
        kind: AggregateKind,
        department: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_available()?;
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .filter(|((k, _), doc)| *k == kind && department.map_or(true, |d| doc.department == d))
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
