use serde::{Deserialize, Serialize};

/// Aggregate identifiers (projects, sprints, deliverables, blockers, ...) are UUIDv7.
pub type EntityId = uuid::Uuid;

/// Employee / user identifiers are opaque strings issued by the directory.
pub type EmployeeId = String;

/// Optimistic-concurrency token bumped by the entity store on every write.
pub type Version = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (start, end, due) carry no time of day.
pub type Date = chrono::NaiveDate;

/// Generate a new time-ordered entity id.
pub fn new_id() -> EntityId {
    uuid::Uuid::now_v7()
}

/// The user on whose behalf an operation runs.
///
/// Passed explicitly to every engine operation; nothing is read from ambient
/// session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: EmployeeId,
    pub name: String,
}

impl Actor {
    pub fn new(user_id: impl Into<EmployeeId>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }
}
