//! Project and deliverable operations.

use serde::Deserialize;

use super::{require_active, require_assignees_are_members, LifecycleEngine};
use crate::aggregate::Aggregate;
use crate::attachment::{Attachment, NewAttachment};
use crate::deliverable::{Deliverable, DeliverableStatus, NewDeliverable};
use crate::error::CoreError;
use crate::lifecycle::ProjectStatus;
use crate::member::{Member, MemberRole};
use crate::project::{NewProject, Project};
use crate::types::{Actor, EntityId};

/// Optional filters for [`LifecycleEngine::list_projects`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub department: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl LifecycleEngine {
    /// Create a project in the acting user's department, led by them.
    ///
    /// Only the head of that department may create its projects.
    pub async fn create_project(&self, input: &NewProject, actor: &Actor) -> Result<Project, CoreError> {
        let employee = self.actor_employee(actor).await?;
        let head = self.directory.department_head(&employee.department).await?;
        if head.map_or(true, |h| h.user_id != employee.id) {
            return Err(CoreError::Validation(format!(
                "only the head of {} can create its projects",
                employee.department
            )));
        }
        let now = chrono::Utc::now();
        let lead = Member {
            user_id: employee.id,
            name: employee.name,
            role: MemberRole::Lead,
            department: employee.department,
            joined_at: now,
            left_at: None,
        };
        let project = self.insert(Project::new(input, lead, now)?).await?;

        tracing::info!(
            project_id = %project.id,
            project_number = %project.project_number,
            department = %project.department,
            actor = %actor.user_id,
            "Project created"
        );
        Ok(project)
    }

    pub async fn get_project(&self, id: EntityId) -> Result<Project, CoreError> {
        self.read(id).await
    }

    /// Projects matching `filter`, newest first.
    pub async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, CoreError> {
        let mut projects: Vec<Project> = self.read_all(filter.department.as_deref()).await?;
        if let Some(status) = filter.status {
            projects.retain(|p| p.status == status);
        }
        projects.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(projects)
    }

    pub async fn change_project_status(
        &self,
        id: EntityId,
        to: ProjectStatus,
        actor: &Actor,
    ) -> Result<Project, CoreError> {
        let (project, from) = self
            .mutate(id, |project: &mut Project, now| {
                let from = project.status;
                project.change_status(to, actor, now)?;
                Ok(from)
            })
            .await?;
        tracing::info!(
            project_id = %id,
            from = from.as_str(),
            to = to.as_str(),
            actor = %actor.user_id,
            "Project status changed"
        );
        Ok(project)
    }

    /// Add a deliverable to an active project. Every assignee must be an
    /// active member.
    pub async fn create_deliverable(
        &self,
        id: EntityId,
        input: &NewDeliverable,
        actor: &Actor,
    ) -> Result<(Project, Deliverable), CoreError> {
        let (project, deliverable) = self
            .mutate(id, |project: &mut Project, now| {
                require_active(project, "add a deliverable")?;
                let deliverable = Deliverable::new(input, actor, now)?;
                require_assignees_are_members(project, &deliverable.assignees)?;
                project.deliverables.push(deliverable.clone());
                project.refresh_health(now);
                Ok(deliverable)
            })
            .await?;
        tracing::info!(
            project_id = %id,
            deliverable_id = %deliverable.id,
            actor = %actor.user_id,
            "Deliverable created"
        );
        Ok((project, deliverable))
    }

    pub async fn change_deliverable_status(
        &self,
        id: EntityId,
        deliverable_id: EntityId,
        to: DeliverableStatus,
        actor: &Actor,
    ) -> Result<Project, CoreError> {
        let (project, from) = self
            .mutate(id, |project: &mut Project, now| {
                let deliverable = project.deliverable_mut(deliverable_id)?;
                let from = deliverable.status;
                deliverable.change_status(to, actor, now)?;
                project.refresh_health(now);
                Ok(from)
            })
            .await?;
        tracing::info!(
            project_id = %id,
            %deliverable_id,
            from = from.as_str(),
            to = to.as_str(),
            actor = %actor.user_id,
            "Deliverable status changed"
        );
        Ok(project)
    }

    /// Report a blocker. Returns the project and the new blocker's id.
    pub async fn add_blocker(
        &self,
        id: EntityId,
        deliverable_id: EntityId,
        description: &str,
        actor: &Actor,
    ) -> Result<(Project, EntityId), CoreError> {
        let (project, blocker_id) = self
            .mutate(id, |project: &mut Project, now| {
                let blocker_id = project
                    .deliverable_mut(deliverable_id)?
                    .add_blocker(description, actor, now)?;
                project.refresh_health(now);
                Ok(blocker_id)
            })
            .await?;
        tracing::info!(
            project_id = %id,
            %deliverable_id,
            %blocker_id,
            actor = %actor.user_id,
            "Blocker added"
        );
        Ok((project, blocker_id))
    }

    pub async fn resolve_blocker(
        &self,
        id: EntityId,
        deliverable_id: EntityId,
        blocker_id: EntityId,
        actor: &Actor,
    ) -> Result<Project, CoreError> {
        let (project, ()) = self
            .mutate(id, |project: &mut Project, now| {
                project
                    .deliverable_mut(deliverable_id)?
                    .resolve_blocker(blocker_id, actor, now)?;
                project.refresh_health(now);
                Ok(())
            })
            .await?;
        tracing::info!(
            project_id = %id,
            %deliverable_id,
            %blocker_id,
            actor = %actor.user_id,
            "Blocker resolved"
        );
        Ok(project)
    }

    pub async fn add_comment(
        &self,
        id: EntityId,
        deliverable_id: EntityId,
        message: &str,
        actor: &Actor,
    ) -> Result<Project, CoreError> {
        let (project, ()) = self
            .mutate(id, |project: &mut Project, now| {
                project
                    .deliverable_mut(deliverable_id)?
                    .add_comment(message, actor, now)
            })
            .await?;
        Ok(project)
    }

    /// Record a submission note. The deliverable's status is unchanged.
    pub async fn submit_deliverable(
        &self,
        id: EntityId,
        deliverable_id: EntityId,
        note: &str,
        actor: &Actor,
    ) -> Result<Project, CoreError> {
        let (project, ()) = self
            .mutate(id, |project: &mut Project, now| {
                project
                    .deliverable_mut(deliverable_id)?
                    .submit(note, actor, now)
            })
            .await?;
        tracing::info!(
            project_id = %id,
            %deliverable_id,
            actor = %actor.user_id,
            "Deliverable submitted"
        );
        Ok(project)
    }

    pub async fn add_deliverable_attachment(
        &self,
        id: EntityId,
        deliverable_id: EntityId,
        input: &NewAttachment,
        actor: &Actor,
    ) -> Result<(Project, Attachment), CoreError> {
        self.mutate(id, |project: &mut Project, now| {
            let attachment = Attachment::new(input, actor, now)?;
            project
                .deliverable_mut(deliverable_id)?
                .attachments
                .push(attachment.clone());
            Ok(attachment)
        })
        .await
    }
}
