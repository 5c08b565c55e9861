//! Deliverables: units of work embedded in a project.
//!
//! Status machine (shared with sprint actions):
//!
//! ```text
//! pending | in-progress | in-review  ->  in-progress | in-review | done
//! done                               ->  in-progress   (reopen)
//! ```
//!
//! No order is forced between the non-terminal states and nothing ever
//! returns to `pending`. Blockers feed health classification only; they never
//! gate a status change.

use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::error::CoreError;
use crate::health::{self, Health};
use crate::lifecycle::StatusChange;
use crate::thread::Comment;
use crate::types::{new_id, Actor, Date, EmployeeId, EntityId, Timestamp};

/// Maximum length of any title.
pub const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliverableStatus {
    Pending,
    InProgress,
    InReview,
    Done,
}

impl DeliverableStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::InReview => "in-review",
            Self::Done => "done",
        }
    }

    pub fn allowed_transitions(self) -> &'static [DeliverableStatus] {
        match self {
            Self::Pending => &[Self::InProgress, Self::InReview, Self::Done],
            Self::InProgress => &[Self::InReview, Self::Done],
            Self::InReview => &[Self::InProgress, Self::Done],
            Self::Done => &[Self::InProgress],
        }
    }

    pub fn can_transition_to(self, to: DeliverableStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

/// Validate a status change for a deliverable or an action.
pub fn validate_work_transition(
    entity: &'static str,
    from: DeliverableStatus,
    to: DeliverableStatus,
) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::IllegalTransition {
            entity,
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// Something preventing progress on a deliverable.
///
/// Addressed by its generated id; list position is not an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    pub id: EntityId,
    pub description: String,
    pub reported_by: EmployeeId,
    pub reported_at: Timestamp,
    pub is_resolved: bool,
    pub resolved_by: Option<EmployeeId>,
    pub resolved_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub note: String,
    pub submitted_by: EmployeeId,
    pub submitted_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub status: DeliverableStatus,
    pub due_date: Option<Date>,
    pub assignees: Vec<EmployeeId>,
    #[serde(default)]
    pub blockers: Vec<Blocker>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub submission: Option<Submission>,
    #[serde(default)]
    pub status_history: Vec<StatusChange<DeliverableStatus>>,
    pub created_by: EmployeeId,
    pub created_at: Timestamp,
}

/// Input for creating a deliverable.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDeliverable {
    pub title: String,
    pub description: String,
    pub due_date: Option<Date>,
    pub assignees: Vec<EmployeeId>,
}

/// Title validation shared by every titled entity.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "title exceeds {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Trim, drop blanks, and de-duplicate assignees while keeping their order.
///
/// Fails when nothing is left.
pub fn normalize_assignees(assignees: &[EmployeeId]) -> Result<Vec<EmployeeId>, CoreError> {
    let mut out: Vec<EmployeeId> = Vec::with_capacity(assignees.len());
    for assignee in assignees {
        let assignee = assignee.trim();
        if !assignee.is_empty() && !out.iter().any(|a| a == assignee) {
            out.push(assignee.to_string());
        }
    }
    if out.is_empty() {
        return Err(CoreError::Validation(
            "at least one assignee is required".into(),
        ));
    }
    Ok(out)
}

impl Deliverable {
    pub fn new(input: &NewDeliverable, actor: &Actor, at: Timestamp) -> Result<Self, CoreError> {
        validate_title(&input.title)?;
        if input.description.trim().is_empty() {
            return Err(CoreError::Validation("description is required".into()));
        }
        let assignees = normalize_assignees(&input.assignees)?;

        Ok(Self {
            id: new_id(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            status: DeliverableStatus::Pending,
            due_date: input.due_date,
            assignees,
            blockers: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
            submission: None,
            status_history: Vec::new(),
            created_by: actor.user_id.clone(),
            created_at: at,
        })
    }

    pub fn change_status(
        &mut self,
        to: DeliverableStatus,
        actor: &Actor,
        at: Timestamp,
    ) -> Result<(), CoreError> {
        validate_work_transition("deliverable", self.status, to)?;
        self.status_history.push(StatusChange {
            from: self.status,
            to,
            changed_by: actor.user_id.clone(),
            changed_at: at,
        });
        self.status = to;
        Ok(())
    }

    /// Append an unresolved blocker and return its id.
    pub fn add_blocker(
        &mut self,
        description: &str,
        actor: &Actor,
        at: Timestamp,
    ) -> Result<EntityId, CoreError> {
        if description.trim().is_empty() {
            return Err(CoreError::Validation(
                "blocker description is required".into(),
            ));
        }
        let blocker = Blocker {
            id: new_id(),
            description: description.trim().to_string(),
            reported_by: actor.user_id.clone(),
            reported_at: at,
            is_resolved: false,
            resolved_by: None,
            resolved_at: None,
        };
        let id = blocker.id;
        self.blockers.push(blocker);
        Ok(id)
    }

    pub fn resolve_blocker(
        &mut self,
        blocker_id: EntityId,
        actor: &Actor,
        at: Timestamp,
    ) -> Result<(), CoreError> {
        let blocker = self
            .blockers
            .iter_mut()
            .find(|b| b.id == blocker_id)
            .ok_or(CoreError::BlockerNotFound { blocker_id })?;
        if blocker.is_resolved {
            return Err(CoreError::Conflict(format!(
                "blocker {blocker_id} is already resolved"
            )));
        }
        blocker.is_resolved = true;
        blocker.resolved_by = Some(actor.user_id.clone());
        blocker.resolved_at = Some(at);
        Ok(())
    }

    pub fn add_comment(&mut self, message: &str, actor: &Actor, at: Timestamp) -> Result<(), CoreError> {
        self.comments.push(Comment::new(message, actor, at)?);
        Ok(())
    }

    /// Record a submission note. The status is left untouched.
    pub fn submit(&mut self, note: &str, actor: &Actor, at: Timestamp) -> Result<(), CoreError> {
        if note.trim().is_empty() {
            return Err(CoreError::Validation("submission note is required".into()));
        }
        self.submission = Some(Submission {
            note: note.trim().to_string(),
            submitted_by: actor.user_id.clone(),
            submitted_at: at,
        });
        Ok(())
    }

    pub fn unresolved_blockers(&self) -> usize {
        self.blockers.iter().filter(|b| !b.is_resolved).count()
    }

    pub fn health(&self, today: Date) -> Health {
        health::classify(
            self.due_date,
            self.status == DeliverableStatus::Done,
            self.unresolved_blockers(),
            today,
        )
    }
}
