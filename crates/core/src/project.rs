//! Project aggregate and its creation rules.

use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, AggregateKind};
use crate::attachment::Attachment;
use crate::deliverable::{validate_title, Deliverable};
use crate::error::CoreError;
use crate::health::{self, Health, HealthSetting};
use crate::lifecycle::{validate_project_transition, ProjectStatus, StatusChange};
use crate::member::{self, Member};
use crate::naming;
use crate::thread::ChatMessage;
use crate::types::{new_id, Actor, Date, EmployeeId, EntityId, Timestamp, Version};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub project_number: String,
    pub title: String,
    pub description: String,
    pub department: String,
    pub status: ProjectStatus,
    pub health: HealthSetting,
    pub start_date: Date,
    pub target_end_date: Option<Date>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub status_history: Vec<StatusChange<ProjectStatus>>,
    pub created_by: EmployeeId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub version: Version,
}

/// Input for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    /// Defaults to the creation date.
    pub start_date: Option<Date>,
    pub target_end_date: Option<Date>,
}

/// Validate the title/description pair shared by projects and sprints.
pub fn validate_header(title: &str, description: &str) -> Result<(), CoreError> {
    validate_title(title)?;
    if description.trim().is_empty() {
        return Err(CoreError::Validation("description is required".into()));
    }
    Ok(())
}

impl Project {
    /// Build a new active project owned by `lead`'s department.
    ///
    /// The creator joins as the project's lead.
    pub fn new(input: &NewProject, lead: Member, at: Timestamp) -> Result<Self, CoreError> {
        validate_header(&input.title, &input.description)?;
        let start_date = input.start_date.unwrap_or_else(|| at.date_naive());
        if let Some(end) = input.target_end_date {
            if end < start_date {
                return Err(CoreError::Validation(
                    "target end date must be after start date".into(),
                ));
            }
        }

        let id = new_id();
        Ok(Self {
            id,
            project_number: naming::project_number(id, at),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            department: lead.department.clone(),
            status: ProjectStatus::Active,
            health: HealthSetting::derived(Health::Healthy, at),
            start_date,
            target_end_date: input.target_end_date,
            created_by: lead.user_id.clone(),
            members: vec![lead],
            deliverables: Vec::new(),
            chat: Vec::new(),
            attachments: Vec::new(),
            status_history: Vec::new(),
            created_at: at,
            updated_at: at,
            version: 0,
        })
    }

    /// Move the project to `to`, recording who did it.
    ///
    /// Reopening requires an active lead, since an active project always has
    /// exactly one.
    pub fn change_status(
        &mut self,
        to: ProjectStatus,
        actor: &Actor,
        at: Timestamp,
    ) -> Result<(), CoreError> {
        validate_project_transition(self.status, to)?;
        if to == ProjectStatus::Active && member::active_lead(&self.members).is_none() {
            return Err(CoreError::Conflict(
                "assign a lead before reopening the project".into(),
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

    pub fn deliverable_mut(&mut self, deliverable_id: EntityId) -> Result<&mut Deliverable, CoreError> {
        self.deliverables
            .iter_mut()
            .find(|d| d.id == deliverable_id)
            .ok_or_else(|| CoreError::not_found("Deliverable", deliverable_id))
    }
}

impl Aggregate for Project {
    const KIND: AggregateKind = AggregateKind::Project;

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
        self.status == ProjectStatus::Active
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
        self.attachments
            .iter()
            .chain(self.deliverables.iter().flat_map(|d| d.attachments.iter()))
            .find(|a| a.id == attachment_id)
    }

    fn health_mut(&mut self) -> &mut HealthSetting {
        &mut self.health
    }

    fn derived_health(&self, today: Date) -> Health {
        health::summarize(self.deliverables.iter().map(|d| d.health(today)))
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}
