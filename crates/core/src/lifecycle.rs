//! Project and sprint status state machines.
//!
//! ```text
//! Project:  active -> completed | archived,  completed | archived -> active
//! Sprint:   active -> completed | closed,    completed | closed   -> active
//! ```
//!
//! There is no direct move between the two terminal states of either
//! machine. Transitions never cascade to members or deliverables.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EmployeeId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    pub fn allowed_transitions(self) -> &'static [ProjectStatus] {
        match self {
            Self::Active => &[Self::Completed, Self::Archived],
            Self::Completed | Self::Archived => &[Self::Active],
        }
    }

    pub fn can_transition_to(self, to: ProjectStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SprintStatus {
    Active,
    Completed,
    Closed,
}

impl SprintStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }

    pub fn allowed_transitions(self) -> &'static [SprintStatus] {
        match self {
            Self::Active => &[Self::Completed, Self::Closed],
            Self::Completed | Self::Closed => &[Self::Active],
        }
    }

    pub fn can_transition_to(self, to: SprintStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

/// One entry in an entity's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub from: S,
    pub to: S,
    pub changed_by: EmployeeId,
    pub changed_at: Timestamp,
}

pub fn validate_project_transition(
    from: ProjectStatus,
    to: ProjectStatus,
) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::IllegalTransition {
            entity: "project",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

pub fn validate_sprint_transition(from: SprintStatus, to: SprintStatus) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::IllegalTransition {
            entity: "sprint",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}
