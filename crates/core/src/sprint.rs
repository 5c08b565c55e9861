//! Sprint aggregate and its lightweight actions.

use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, AggregateKind};
use crate::attachment::Attachment;
use crate::deliverable::{normalize_assignees, validate_title, validate_work_transition, DeliverableStatus};
use crate::error::CoreError;
use crate::health::{self, Health, HealthSetting};
use crate::lifecycle::{validate_sprint_transition, SprintStatus, StatusChange};
use crate::member::{self, Member};
use crate::naming;
use crate::project::validate_header;
use crate::thread::ChatMessage;
use crate::types::{new_id, Actor, Date, EmployeeId, EntityId, Timestamp, Version};

/// A deliverable-like unit of work inside a sprint.
///
/// Actions share the deliverable status machine but carry no blockers, so
/// their health is either `healthy` or, when overdue, `delayed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: DeliverableStatus,
    pub due_date: Option<Date>,
    pub assignees: Vec<EmployeeId>,
    #[serde(default)]
    pub status_history: Vec<StatusChange<DeliverableStatus>>,
    pub created_by: EmployeeId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAction {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<Date>,
    pub assignees: Vec<EmployeeId>,
}

impl Action {
    pub fn new(input: &NewAction, actor: &Actor, at: Timestamp) -> Result<Self, CoreError> {
        validate_title(&input.title)?;
        let assignees = normalize_assignees(&input.assignees)?;
        Ok(Self {
            id: new_id(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            status: DeliverableStatus::Pending,
            due_date: input.due_date,
            assignees,
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
        validate_work_transition("action", self.status, to)?;
        self.status_history.push(StatusChange {
            from: self.status,
            to,
            changed_by: actor.user_id.clone(),
            changed_at: at,
        });
        self.status = to;
        Ok(())
    }

    pub fn health(&self, today: Date) -> Health {
        health::classify(
            self.due_date,
            self.status == DeliverableStatus::Done,
            0,
            today,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub id: EntityId,
    pub sprint_number: String,
    pub title: String,
    pub description: String,
    /// Parent project; `None` for a standalone sprint.
    pub project_id: Option<EntityId>,
    pub department: String,
    pub status: SprintStatus,
    pub health: HealthSetting,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub status_history: Vec<StatusChange<SprintStatus>>,
    pub created_by: EmployeeId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub version: Version,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSprint {
    pub title: String,
    pub description: String,
    pub project_id: Option<EntityId>,
    pub start_date: Date,
    pub end_date: Date,
}

impl Sprint {
    /// Build a new active sprint led by its creator.
    pub fn new(input: &NewSprint, lead: Member, at: Timestamp) -> Result<Self, CoreError> {
        validate_header(&input.title, &input.description)?;
        if input.end_date < input.start_date {
            return Err(CoreError::Validation(
                "end date must be after start date".into(),
            ));
        }

        let id = new_id();
        Ok(Self {
            id,
            sprint_number: naming::sprint_number(id, at),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            project_id: input.project_id,
            department: lead.department.clone(),
            status: SprintStatus::Active,
            health: HealthSetting::derived(Health::Healthy, at),
            start_date: input.start_date,
            end_date: input.end_date,
            created_by: lead.user_id.clone(),
            members: vec![lead],
            actions: Vec::new(),
            chat: Vec::new(),
            attachments: Vec::new(),
            status_history: Vec::new(),
            created_at: at,
            updated_at: at,
            version: 0,
        })
    }

    pub fn change_status(
        &mut self,
        to: SprintStatus,
        actor: &Actor,
        at: Timestamp,
    ) -> Result<(), CoreError> {
        validate_sprint_transition(self.status, to)?;
        if to == SprintStatus::Active && member::active_lead(&self.members).is_none() {
            return Err(CoreError::Conflict(
                "assign a lead before reopening the sprint".into(),
            ));
        }
        self.status_history.push(StatusChange {
            from: self.status,
            to,
            changed_by: actor.user_id.clone(),
            changed_at: at,
        });
        self.status = to;
        Ok(())
    }

    pub fn action_mut(&mut self, action_id: EntityId) -> Result<&mut Action, CoreError> {
        self.actions
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| CoreError::not_found("Action", action_id))
    }
}

impl Aggregate for Sprint {
    const KIND: AggregateKind = AggregateKind::Sprint;

    fn id(&self) -> EntityId {
        self.id
    }

    fn department(&self) -> &str {
        &self.department
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn is_active(&self) -> bool {
        self.status == SprintStatus::Active
    }

    fn members(&self) -> &[Member] {
        &self.members
    }

    fn members_mut(&mut self) -> &mut Vec<Member> {
        &mut self.members
    }

    fn attachments_mut(&mut self) -> &mut Vec<Attachment> {
        &mut self.attachments
    }

    fn find_attachment(&self, attachment_id: EntityId) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.id == attachment_id)
    }

    fn health_mut(&mut self) -> &mut HealthSetting {
        &mut self.health
    }

    fn derived_health(&self, today: Date) -> Health {
        health::summarize(self.actions.iter().map(|a| a.health(today)))
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::MemberRole;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, Utc};

    fn lead() -> Member {
        Member {
            user_id: "U1".into(),
            name: "Uma".into(),
            role: MemberRole::Lead,
            department: "Finance".into(),
            joined_at: Utc::now(),
            left_at: None,
        }
    }

    fn input() -> NewSprint {
        NewSprint {
            title: "Sprint 14".into(),
            description: "Close-out tasks".into(),
            project_id: None,
            start_date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 13).unwrap(),
        }
    }

    #[test]
    fn standalone_sprint_is_active() {
        let sprint = Sprint::new(&input(), lead(), Utc::now()).unwrap();
        assert_eq!(sprint.status, SprintStatus::Active);
        assert!(sprint.project_id.is_none());
        assert!(sprint.sprint_number.starts_with("SPR-"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut bad = input();
        bad.end_date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let err = Sprint::new(&bad, lead(), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "end date must be after start date");
    }

    #[test]
    fn single_day_sprint_is_allowed() {
        let mut one_day = input();
        one_day.end_date = one_day.start_date;
        assert!(Sprint::new(&one_day, lead(), Utc::now()).is_ok());
    }

    #[test]
    fn closed_sprint_cannot_complete() {
        let actor = Actor::new("U1", "Uma");
        let mut sprint = Sprint::new(&input(), lead(), Utc::now()).unwrap();
        sprint.change_status(SprintStatus::Closed, &actor, Utc::now()).unwrap();
        assert_matches!(
            sprint.change_status(SprintStatus::Completed, &actor, Utc::now()),
            Err(CoreError::IllegalTransition { entity: "sprint", .. })
        );
        sprint.change_status(SprintStatus::Active, &actor, Utc::now()).unwrap();
    }

    #[test]
    fn overdue_action_makes_sprint_delayed() {
        let actor = Actor::new("U1", "Uma");
        let now = Utc::now();
        let mut sprint = Sprint::new(&input(), lead(), now).unwrap();
        let mut action = Action::new(
            &NewAction {
                title: "Reconcile ledger".into(),
                description: String::new(),
                due_date: NaiveDate::from_ymd_opt(2020, 1, 1),
                assignees: vec!["U1".into()],
            },
            &actor,
            now,
        )
        .unwrap();
        sprint.actions.push(action.clone());
        assert_eq!(sprint.derived_health(now.date_naive()), Health::Delayed);

        action.change_status(DeliverableStatus::Done, &actor, now).unwrap();
        sprint.actions[0] = action;
        assert_eq!(sprint.derived_health(now.date_naive()), Health::Healthy);
    }
}
