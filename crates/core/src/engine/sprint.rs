//! Sprint and action operations.

use serde::Deserialize;

use super::{require_active, require_assignees_are_members, LifecycleEngine};
use crate::aggregate::Aggregate;
use crate::deliverable::DeliverableStatus;
use crate::error::CoreError;
use crate::lifecycle::SprintStatus;
use crate::member::{Member, MemberRole};
use crate::project::Project;
use crate::sprint::{Action, NewAction, NewSprint, Sprint};
use crate::types::{Actor, EntityId};

/// Optional filters for [`LifecycleEngine::list_sprints`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SprintFilter {
    pub department: Option<String>,
    pub project_id: Option<EntityId>,
    pub status: Option<SprintStatus>,
}

impl LifecycleEngine {
    /// Create a sprint in the acting user's department, led by them.
    ///
    /// A referenced project must exist.
    pub async fn create_sprint(&self, input: &NewSprint, actor: &Actor) -> Result<Sprint, CoreError> {
        if let Some(project_id) = input.project_id {
            self.load::<Project>(project_id).await?;
        }
        let employee = self.actor_employee(actor).await?;
        let now = chrono::Utc::now();
        let lead = Member {
            user_id: employee.id,
            name: employee.name,
            role: MemberRole::Lead,
            department: employee.department,
            joined_at: now,
            left_at: None,
        };
        let sprint = self.insert(Sprint::new(input, lead, now)?).await?;

        tracing::info!(
            sprint_id = %sprint.id,
            sprint_number = %sprint.sprint_number,
            project_id = ?sprint.project_id,
            actor = %actor.user_id,
            "Sprint created"
        );
        Ok(sprint)
    }

    pub async fn get_sprint(&self, id: EntityId) -> Result<Sprint, CoreError> {
        self.read(id).await
    }

    /// Sprints matching `filter`, newest first.
    pub async fn list_sprints(&self, filter: &SprintFilter) -> Result<Vec<Sprint>, CoreError> {
        let mut sprints: Vec<Sprint> = self.read_all(filter.department.as_deref()).await?;
        sprints.retain(|s| {
            filter.project_id.map_or(true, |p| s.project_id == Some(p))
                && filter.status.map_or(true, |st| s.status == st)
        });
        sprints.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(sprints)
    }

    pub async fn change_sprint_status(
        &self,
        id: EntityId,
        to: SprintStatus,
        actor: &Actor,
    ) -> Result<Sprint, CoreError> {
        let (sprint, from) = self
            .mutate(id, |sprint: &mut Sprint, now| {
                let from = sprint.status;
                sprint.change_status(to, actor, now)?;
                Ok(from)
            })
            .await?;
        tracing::info!(
            sprint_id = %id,
            from = from.as_str(),
            to = to.as_str(),
            actor = %actor.user_id,
            "Sprint status changed"
        );
        Ok(sprint)
    }

    pub async fn create_action(
        &self,
        id: EntityId,
        input: &NewAction,
        actor: &Actor,
    ) -> Result<(Sprint, Action), CoreError> {
        let (sprint, action) = self
            .mutate(id, |sprint: &mut Sprint, now| {
                require_active(sprint, "add an action")?;
                let action = Action::new(input, actor, now)?;
                require_assignees_are_members(sprint, &action.assignees)?;
                sprint.actions.push(action.clone());
                sprint.refresh_health(now);
                Ok(action)
            })
            .await?;
        tracing::info!(
            sprint_id = %id,
            action_id = %action.id,
            actor = %actor.user_id,
            "Action created"
        );
        Ok((sprint, action))
    }

    pub async fn change_action_status(
        &self,
        id: EntityId,
        action_id: EntityId,
        to: DeliverableStatus,
        actor: &Actor,
    ) -> Result<Sprint, CoreError> {
        let (sprint, ()) = self
            .mutate(id, |sprint: &mut Sprint, now| {
                sprint.action_mut(action_id)?.change_status(to, actor, now)?;
                sprint.refresh_health(now);
                Ok(())
            })
            .await?;
        tracing::info!(
            sprint_id = %id,
            %action_id,
            to = to.as_str(),
            actor = %actor.user_id,
            "Action status changed"
        );
        Ok(sprint)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::super::test_support::{engine, uma};
    use super::*;
    use crate::health::Health;
    use crate::project::NewProject;

    fn new_sprint(project_id: Option<EntityId>) -> NewSprint {
        NewSprint {
            title: "Sprint 7".into(),
            description: "Close-out".into(),
            project_id,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
        }
    }

    #[tokio::test]
    async fn sprint_for_missing_project_is_not_found() {
        let engine = engine();
        assert_matches!(
            engine
                .create_sprint(&new_sprint(Some(crate::types::new_id())), &uma())
                .await,
            Err(CoreError::NotFound { entity: "Project", .. })
        );
    }

    #[tokio::test]
    async fn sprints_filter_by_project() {
        let engine = engine();
        let project = engine
            .create_project(
                &NewProject {
                    title: "Budget".into(),
                    description: "Budget".into(),
                    start_date: None,
                    target_end_date: None,
                },
                &uma(),
            )
            .await
            .unwrap();
        let linked = engine
            .create_sprint(&new_sprint(Some(project.id)), &uma())
            .await
            .unwrap();
        engine.create_sprint(&new_sprint(None), &uma()).await.unwrap();

        let sprints = engine
            .list_sprints(&SprintFilter {
                project_id: Some(project.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sprints.len(), 1);
        assert_eq!(sprints[0].id, linked.id);
        assert_eq!(engine.list_sprints(&SprintFilter::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn closed_sprint_reopens_but_cannot_complete() {
        let engine = engine();
        let sprint = engine.create_sprint(&new_sprint(None), &uma()).await.unwrap();
        engine
            .change_sprint_status(sprint.id, SprintStatus::Closed, &uma())
            .await
            .unwrap();
        assert_matches!(
            engine
                .change_sprint_status(sprint.id, SprintStatus::Completed, &uma())
                .await,
            Err(CoreError::IllegalTransition { .. })
        );
        let sprint = engine
            .change_sprint_status(sprint.id, SprintStatus::Active, &uma())
            .await
            .unwrap();
        assert_eq!(sprint.status, SprintStatus::Active);
    }

    #[tokio::test]
    async fn overdue_action_delays_the_sprint() {
        let engine = engine();
        let sprint = engine.create_sprint(&new_sprint(None), &uma()).await.unwrap();
        let (sprint, action) = engine
            .create_action(
                sprint.id,
                &NewAction {
                    title: "File report".into(),
                    description: String::new(),
                    due_date: NaiveDate::from_ymd_opt(2020, 6, 1),
                    assignees: vec!["U1".into()],
                },
                &uma(),
            )
            .await
            .unwrap();
        assert_eq!(sprint.health.value, Health::Delayed);

        let sprint = engine
            .change_action_status(sprint.id, action.id, DeliverableStatus::Done, &uma())
            .await
            .unwrap();
        assert_eq!(sprint.health.value, Health::Healthy);
        assert_eq!(sprint.actions[0].status_history.len(), 1);
    }

    #[tokio::test]
    async fn action_assignees_must_be_members() {
        let engine = engine();
        let sprint = engine.create_sprint(&new_sprint(None), &uma()).await.unwrap();
        assert_matches!(
            engine
                .create_action(
                    sprint.id,
                    &NewAction {
                        title: "File report".into(),
                        description: String::new(),
                        due_date: None,
                        assignees: vec!["U2".into()],
                    },
                    &uma(),
                )
                .await,
            Err(CoreError::Validation(_))
        );
    }
}
