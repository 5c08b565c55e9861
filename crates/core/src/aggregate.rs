//! The behaviour shared by projects and sprints.
//!
//! Both are aggregates: one document holding the entity and every embedded
//! collection, read and written as a unit against a single version.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::health::{Health, HealthSetting, HealthSource};
use crate::member::Member;
use crate::types::{Date, EntityId, Timestamp, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Project,
    Sprint,
}

impl AggregateKind {
    /// Lower-case name used for storage and event types.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Sprint => "sprint",
        }
    }

    /// Capitalised name used in user-facing messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Sprint => "Sprint",
        }
    }
}

pub trait Aggregate: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: AggregateKind;

    fn id(&self) -> EntityId;
    fn department(&self) -> &str;

    fn version(&self) -> Version;
    fn set_version(&mut self, version: Version);

    /// Whether the aggregate is in its `active` status.
    fn is_active(&self) -> bool;

    fn members(&self) -> &[Member];
    fn members_mut(&mut self) -> &mut Vec<Member>;

    fn attachments_mut(&mut self) -> &mut Vec<Attachment>;

    /// Find an attachment anywhere in the aggregate, embedded children included.
    fn find_attachment(&self, attachment_id: EntityId) -> Option<&Attachment>;

    fn health_mut(&mut self) -> &mut HealthSetting;

    /// Summary health of the aggregate's children as of `today`.
    fn derived_health(&self, today: Date) -> Health;

    fn touch(&mut self, at: Timestamp);

    /// Replace the stored health with the derived summary.
    fn refresh_health(&mut self, at: Timestamp) {
        let value = self.derived_health(at.date_naive());
        *self.health_mut() = HealthSetting::derived(value, at);
    }

    /// Bring a derived health value up to date as of `today`.
    ///
    /// Operator-set values are left alone and nothing is persisted.
    fn current_health(mut self, today: Date) -> Self {
        let value = self.derived_health(today);
        let health = self.health_mut();
        if health.source == HealthSource::Derived {
            health.value = value;
        }
        self
    }
}
