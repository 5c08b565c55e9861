//! Health classification for deliverables, actions, and their aggregates.
//!
//! Health is derived, not a state machine. A deliverable is:
//!
//! - `delayed` when its due date has passed and it is not done (this wins
//!   over blockers, so a blocked and overdue deliverable is `delayed`),
//! - otherwise `at-risk` when it has at least one unresolved blocker,
//! - otherwise `healthy`.
//!
//! Projects and sprints store a [`HealthSetting`]. An operator may set any
//! value (including `critical`, which has no automatic trigger); the value
//! stands until the next recomputation trigger replaces it with the derived
//! summary, i.e. the least healthy classification among the children.

use serde::{Deserialize, Serialize};

use crate::types::{Date, EmployeeId, Timestamp};

/// Ordered from healthiest to least healthy; `Ord` follows declaration order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Health {
    #[default]
    Healthy,
    AtRisk,
    Delayed,
    Critical,
}

impl Health {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::AtRisk => "at-risk",
            Self::Delayed => "delayed",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthSource {
    Operator,
    Derived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSetting {
    pub value: Health,
    pub source: HealthSource,
    pub updated_by: Option<EmployeeId>,
    pub updated_at: Timestamp,
}

impl HealthSetting {
    pub fn derived(value: Health, at: Timestamp) -> Self {
        Self {
            value,
            source: HealthSource::Derived,
            updated_by: None,
            updated_at: at,
        }
    }

    pub fn operator(value: Health, by: impl Into<EmployeeId>, at: Timestamp) -> Self {
        Self {
            value,
            source: HealthSource::Operator,
            updated_by: Some(by.into()),
            updated_at: at,
        }
    }
}

/// `true` when `due` lies strictly before `today`.
pub fn is_overdue(due: Option<Date>, today: Date) -> bool {
    due.is_some_and(|d| d < today)
}

/// Classify a single unit of work.
///
/// `done` marks a finished item, which is never overdue.
pub fn classify(due: Option<Date>, done: bool, unresolved_blockers: usize, today: Date) -> Health {
    if !done && is_overdue(due, today) {
        Health::Delayed
    } else if unresolved_blockers > 0 {
        Health::AtRisk
    } else {
        Health::Healthy
    }
}

/// The least healthy classification present, or `healthy` for none.
pub fn summarize<I>(items: I) -> Health
where
    I: IntoIterator<Item = Health>,
{
    items.into_iter().max().unwrap_or_default()
}
