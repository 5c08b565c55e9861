//! The lifecycle engine: every exposed operation, wired to the collaborators.
//!
//! Each mutation follows the same shape: load the aggregate, apply a pure
//! transform, write it back conditionally on the version that was read. A
//! version conflict reloads and re-applies the transform, up to
//! [`EngineConfig::write_retries`] attempts.
//!
//! Operations are split by aggregate:
//!
//! - [`shared`]: members, health, attachments and chat on either aggregate
//! - [`project`]: projects and their deliverables
//! - [`sprint`]: sprints and their actions

mod project;
mod shared;
mod sprint;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::aggregate::Aggregate;
use crate::directory::{
    CachedDirectory, DirectoryLookup, Employee, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS,
};
use crate::error::CoreError;
use crate::store::{Document, EntityStore, StoreError};
use crate::types::{Actor, EntityId, Timestamp};

pub use project::ProjectFilter;
pub use shared::MemberChange;
pub use sprint::SprintFilter;

/// Default number of attempts for a version-checked write.
pub const DEFAULT_WRITE_RETRIES: u32 = 3;

/// Tunables for [`LifecycleEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attempts per mutation before a version conflict is reported.
    pub write_retries: u32,
    pub directory_cache_ttl: Duration,
    pub directory_cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            write_retries: DEFAULT_WRITE_RETRIES,
            directory_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            directory_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

pub struct LifecycleEngine {
    store: Arc<dyn EntityStore>,
    directory: Arc<dyn DirectoryLookup>,
    config: EngineConfig,
}

impl LifecycleEngine {
    /// Build an engine. The directory is wrapped in a TTL cache.
    pub fn new(
        store: Arc<dyn EntityStore>,
        directory: Arc<dyn DirectoryLookup>,
        config: EngineConfig,
    ) -> Self {
        let directory: Arc<dyn DirectoryLookup> = Arc::new(CachedDirectory::new(
            directory,
            config.directory_cache_ttl,
            config.directory_cache_capacity,
        ));
        Self {
            store,
            directory,
            config,
        }
    }

    /// Probe the entity store.
    pub async fn ping_store(&self) -> Result<(), CoreError> {
        Ok(self.store.ping().await?)
    }

    /// Normalize a stored file reference into a storage-relative key.
    pub fn resolve_download_reference(&self, stored: &str) -> Result<String, CoreError> {
        crate::attachment::resolve_download_reference(stored)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// The acting user's directory record. Unknown users fail closed.
    async fn actor_employee(&self, actor: &Actor) -> Result<Employee, CoreError> {
        self.directory
            .employee(&actor.user_id)
            .await?
            .filter(|e| !e.department.trim().is_empty())
            .ok_or_else(|| CoreError::DirectoryLookupFailed {
                employee_id: actor.user_id.clone(),
            })
    }

    async fn load<A: Aggregate>(&self, id: EntityId) -> Result<A, CoreError> {
        let doc = self
            .store
            .get(A::KIND, id)
            .await?
            .ok_or_else(|| CoreError::not_found(A::KIND.entity_name(), id))?;
        decode(doc)
    }

    /// [`Self::load`] for callers, with derived health as of today.
    async fn read<A: Aggregate>(&self, id: EntityId) -> Result<A, CoreError> {
        let aggregate: A = self.load(id).await?;
        Ok(aggregate.current_health(Utc::now().date_naive()))
    }

    async fn read_all<A: Aggregate>(&self, department: Option<&str>) -> Result<Vec<A>, CoreError> {
        let today = Utc::now().date_naive();
        Ok(self
            .list_all::<A>(department)
            .await?
            .into_iter()
            .map(|a| a.current_health(today))
            .collect())
    }

    async fn insert<A: Aggregate>(&self, mut aggregate: A) -> Result<A, CoreError> {
        let body = encode(&aggregate)?;
        let doc = self
            .store
            .create(A::KIND, aggregate.id(), aggregate.department(), body)
            .await?;
        aggregate.set_version(doc.version);
        Ok(aggregate)
    }

    async fn list_all<A: Aggregate>(&self, department: Option<&str>) -> Result<Vec<A>, CoreError> {
        self.store
            .list(A::KIND, department)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Apply `transform` to aggregate `id` and persist the result.
    ///
    /// A transform that leaves the document unchanged is not written.
    async fn mutate<A, T, F>(&self, id: EntityId, mut transform: F) -> Result<(A, T), CoreError>
    where
        A: Aggregate,
        F: FnMut(&mut A, Timestamp) -> Result<T, CoreError>,
    {
        let attempts = self.config.write_retries.max(1);
        for attempt in 1..=attempts {
            let mut aggregate: A = self.load(id).await?;
            let expected = aggregate.version();
            let before = encode(&aggregate)?;

            let now = Utc::now();
            let output = transform(&mut aggregate, now)?;
            if encode(&aggregate)? == before {
                return Ok((aggregate, output));
            }
            aggregate.touch(now);

            match self
                .store
                .update(A::KIND, id, expected, encode(&aggregate)?)
                .await
            {
                Ok(doc) => {
                    aggregate.set_version(doc.version);
                    return Ok((aggregate, output));
                }
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::warn!(
                        kind = A::KIND.as_str(),
                        %id,
                        attempt,
                        attempts,
                        "Version conflict, reloading"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CoreError::Conflict(format!(
            "{} {id} was modified concurrently; try again",
            A::KIND.as_str()
        )))
    }
}

fn decode<A: Aggregate>(doc: Document) -> Result<A, CoreError> {
    let mut aggregate: A = serde_json::from_value(doc.body).map_err(|e| {
        CoreError::Internal(format!(
            "stored {} {} is malformed: {e}",
            A::KIND.as_str(),
            doc.id
        ))
    })?;
    aggregate.set_version(doc.version);
    Ok(aggregate)
}

fn encode<A: Aggregate>(aggregate: &A) -> Result<Value, CoreError> {
    serde_json::to_value(aggregate)
        .map_err(|e| CoreError::Internal(format!("cannot encode {}: {e}", A::KIND.as_str())))
}

/// Fail unless the aggregate is active.
fn require_active<A: Aggregate>(aggregate: &A, action: &str) -> Result<(), CoreError> {
    if aggregate.is_active() {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "cannot {action} on an inactive {}",
            A::KIND.as_str()
        )))
    }
}

/// Fail unless every assignee is an active member.
fn require_assignees_are_members<A: Aggregate>(
    aggregate: &A,
    assignees: &[String],
) -> Result<(), CoreError> {
    match assignees
        .iter()
        .find(|a| !crate::member::is_active_member(aggregate.members(), a.trim()))
    {
        Some(outsider) => Err(CoreError::Validation(format!(
            "assignee {} is not an active member of this {}",
            outsider.trim(),
            A::KIND.as_str()
        ))),
        None => Ok(()),
    }
}
