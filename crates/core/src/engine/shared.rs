//! Operations available on both projects and sprints.

use serde::Serialize;

use super::LifecycleEngine;
use crate::aggregate::Aggregate;
use crate::attachment::{Attachment, NewAttachment};
use crate::error::CoreError;
use crate::health::{Health, HealthSetting};
use crate::member::{self, Member, MemberRole};
use crate::membership::{self, Composition, Escalation};
use crate::thread::ChatMessage;
use crate::types::{Actor, EmployeeId, EntityId};

/// Result of [`LifecycleEngine::add_member`].
#[derive(Debug, Clone, Serialize)]
pub struct MemberChange<A> {
    pub aggregate: A,
    /// Members appended by this call, candidate first.
    pub added: Vec<Member>,
    /// `None` when the candidate was already active.
    pub escalation: Option<Escalation>,
    pub already_member: bool,
}

impl LifecycleEngine {
    pub async fn get<A: Aggregate>(&self, id: EntityId) -> Result<A, CoreError> {
        self.load(id).await
    }

    /// Add `candidate_id`, escalating to their department head when they come
    /// from another department.
    ///
    /// Re-adding an active member is a no-op reported through
    /// `already_member`.
    pub async fn add_member<A: Aggregate>(
        &self,
        id: EntityId,
        candidate_id: &str,
        requested_role: Option<MemberRole>,
        actor: &Actor,
    ) -> Result<MemberChange<A>, CoreError> {
        let candidate_id = candidate_id.trim();
        if candidate_id.is_empty() {
            return Err(CoreError::Validation("user id is required".into()));
        }

        let current: A = self.load(id).await?;
        if member::is_active_member(current.members(), candidate_id) {
            return Ok(MemberChange {
                aggregate: current,
                added: Vec::new(),
                escalation: None,
                already_member: true,
            });
        }

        let candidate =
            membership::lookup_candidate(self.directory.as_ref(), current.department(), candidate_id)
                .await?;

        let (aggregate, composition) = self
            .mutate(id, |agg: &mut A, now| {
                let composition = membership::compose(
                    A::KIND,
                    agg.department(),
                    agg.members(),
                    &candidate,
                    requested_role,
                    now,
                )?;
                if let Composition::Admit { members, .. } = &composition {
                    agg.members_mut().extend(members.iter().cloned());
                }
                Ok(composition)
            })
            .await?;

        Ok(match composition {
            Composition::AlreadyMember => MemberChange {
                aggregate,
                added: Vec::new(),
                escalation: None,
                already_member: true,
            },
            Composition::Admit {
                members,
                escalation,
            } => {
                tracing::info!(
                    kind = A::KIND.as_str(),
                    aggregate_id = %id,
                    member = candidate_id,
                    escalation = ?escalation,
                    actor = %actor.user_id,
                    "Member added"
                );
                MemberChange {
                    aggregate,
                    added: members,
                    escalation: Some(escalation),
                    already_member: false,
                }
            }
        })
    }

    pub async fn remove_member<A: Aggregate>(
        &self,
        id: EntityId,
        user_id: &str,
        actor: &Actor,
    ) -> Result<A, CoreError> {
        let (aggregate, ()) = self
            .mutate(id, |agg: &mut A, now| {
                let active = agg.is_active();
                membership::remove_member(agg.members_mut(), user_id, active, now)
            })
            .await?;
        tracing::info!(
            kind = A::KIND.as_str(),
            aggregate_id = %id,
            member = user_id,
            actor = %actor.user_id,
            "Member removed"
        );
        Ok(aggregate)
    }

    /// Make `new_lead_id` the lead. Returns the aggregate and the demoted lead.
    pub async fn reassign_lead<A: Aggregate>(
        &self,
        id: EntityId,
        new_lead_id: &str,
        actor: &Actor,
    ) -> Result<(A, Option<EmployeeId>), CoreError> {
        let (aggregate, previous) = self
            .mutate(id, |agg: &mut A, _| {
                membership::reassign_lead(agg.members_mut(), new_lead_id)
            })
            .await?;
        tracing::info!(
            kind = A::KIND.as_str(),
            aggregate_id = %id,
            lead = new_lead_id,
            previous = ?previous,
            actor = %actor.user_id,
            "Lead reassigned"
        );
        Ok((aggregate, previous))
    }

    /// Store an operator health value. It stands until the next automatic
    /// recomputation.
    pub async fn set_health<A: Aggregate>(
        &self,
        id: EntityId,
        value: Health,
        actor: &Actor,
    ) -> Result<A, CoreError> {
        let (aggregate, ()) = self
            .mutate(id, |agg: &mut A, now| {
                *agg.health_mut() = HealthSetting::operator(value, actor.user_id.clone(), now);
                Ok(())
            })
            .await?;
        tracing::info!(
            kind = A::KIND.as_str(),
            aggregate_id = %id,
            health = value.as_str(),
            actor = %actor.user_id,
            "Health set"
        );
        Ok(aggregate)
    }

    /// Replace the stored health with the summary of the aggregate's work items.
    pub async fn recompute_health<A: Aggregate>(&self, id: EntityId) -> Result<A, CoreError> {
        let (aggregate, ()) = self
            .mutate(id, |agg: &mut A, now| {
                agg.refresh_health(now);
                Ok(())
            })
            .await?;
        Ok(aggregate)
    }

    pub async fn add_attachment<A: Aggregate>(
        &self,
        id: EntityId,
        input: &NewAttachment,
        actor: &Actor,
    ) -> Result<(A, Attachment), CoreError> {
        let (aggregate, attachment) = self
            .mutate(id, |agg: &mut A, now| {
                let attachment = Attachment::new(input, actor, now)?;
                agg.attachments_mut().push(attachment.clone());
                Ok(attachment)
            })
            .await?;
        tracing::debug!(
            kind = A::KIND.as_str(),
            aggregate_id = %id,
            attachment_id = %attachment.id,
            "Attachment recorded"
        );
        Ok((aggregate, attachment))
    }

    /// Storage key for a recorded attachment, wherever it sits in the aggregate.
    pub async fn download_reference<A: Aggregate>(
        &self,
        id: EntityId,
        attachment_id: EntityId,
    ) -> Result<String, CoreError> {
        let aggregate: A = self.load(id).await?;
        aggregate
            .find_attachment(attachment_id)
            .ok_or_else(|| CoreError::not_found("Attachment", attachment_id))?
            .download_reference()
    }

    /// Append a chat message with the store's atomic array append.
    pub async fn add_chat_message<A: Aggregate>(
        &self,
        id: EntityId,
        message: &str,
        actor: &Actor,
    ) -> Result<A, CoreError> {
        let message = ChatMessage::new(message, actor, chrono::Utc::now())?;
        let value = serde_json::to_value(&message)
            .map_err(|e| CoreError::Internal(format!("cannot encode chat message: {e}")))?;
        let doc = self.store.append(A::KIND, id, "chat", value).await?;
        super::decode(doc)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::super::test_support::{engine, engine_with, uma, RacingStore};
    use super::*;
    use crate::health::HealthSource;
    use crate::project::{NewProject, Project};
    use crate::sprint::{NewSprint, Sprint};

    fn new_project() -> NewProject {
        NewProject {
            title: "Budget 2027".into(),
            description: "Annual budget".into(),
            start_date: None,
            target_end_date: None,
        }
    }

    fn active(members: &[Member]) -> Vec<(&str, MemberRole)> {
        member::active_members(members)
            .map(|m| (m.user_id.as_str(), m.role))
            .collect()
    }

    #[tokio::test]
    async fn cross_department_scenario() {
        let engine = engine();
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();
        assert_eq!(project.department, "Finance");

        let change = engine
            .add_member::<Project>(project.id, "U2", None, &uma())
            .await
            .unwrap();
        assert_eq!(change.added.len(), 2);
        assert_eq!(
            active(&change.aggregate.members),
            vec![
                ("U1", MemberRole::Lead),
                ("U2", MemberRole::Member),
                ("U3", MemberRole::DeptHead)
            ]
        );

        let again = engine
            .add_member::<Project>(project.id, "U2", None, &uma())
            .await
            .unwrap();
        assert!(again.already_member);
        assert_eq!(again.aggregate.version, change.aggregate.version);

        let after = engine
            .remove_member::<Project>(project.id, "U2", &uma())
            .await
            .unwrap();
        assert_eq!(
            active(&after.members),
            vec![("U1", MemberRole::Lead), ("U3", MemberRole::DeptHead)]
        );
        assert_eq!(after.members.len(), 3);
    }

    #[tokio::test]
    async fn unknown_candidate_adds_nobody() {
        let engine = engine();
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();
        assert_matches!(
            engine.add_member::<Project>(project.id, "ghost", None, &uma()).await,
            Err(CoreError::DirectoryLookupFailed { .. })
        );
        let stored: Project = engine.get(project.id).await.unwrap();
        assert_eq!(stored.members.len(), 1);
        assert_eq!(stored.version, project.version);
    }

    #[tokio::test]
    async fn lead_must_be_reassigned_before_removal() {
        let engine = engine();
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();
        engine
            .add_member::<Project>(project.id, "U4", None, &uma())
            .await
            .unwrap();

        assert_matches!(
            engine.remove_member::<Project>(project.id, "U1", &uma()).await,
            Err(CoreError::Conflict(_))
        );

        let (project, previous) = engine
            .reassign_lead::<Project>(project.id, "U4", &uma())
            .await
            .unwrap();
        assert_eq!(previous.as_deref(), Some("U1"));
        assert_eq!(member::active_lead(&project.members).unwrap().user_id, "U4");
        engine
            .remove_member::<Project>(project.id, "U1", &uma())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sprint_members_default_to_member_role() {
        let engine = engine();
        let sprint = engine
            .create_sprint(
                &NewSprint {
                    title: "Sprint 1".into(),
                    description: "First".into(),
                    project_id: None,
                    start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                    end_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 16).unwrap(),
                },
                &uma(),
            )
            .await
            .unwrap();
        let change = engine
            .add_member::<Sprint>(sprint.id, "U4", None, &uma())
            .await
            .unwrap();
        assert_eq!(change.added[0].role, MemberRole::Member);
        assert_eq!(change.escalation, Some(Escalation::NotRequired));
    }

    #[tokio::test]
    async fn operator_health_stands_until_recompute() {
        let engine = engine();
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();
        let project: Project = engine
            .set_health(project.id, Health::Critical, &uma())
            .await
            .unwrap();
        assert_eq!(project.health.value, Health::Critical);
        assert_eq!(project.health.source, HealthSource::Operator);
        assert_eq!(project.health.updated_by.as_deref(), Some("U1"));

        let project: Project = engine.recompute_health(project.id).await.unwrap();
        assert_eq!(project.health.value, Health::Healthy);
        assert_eq!(project.health.source, HealthSource::Derived);
    }

    #[tokio::test]
    async fn attachments_resolve_to_storage_keys() {
        let engine = engine();
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();
        let (_, attachment) = engine
            .add_attachment::<Project>(
                project.id,
                &NewAttachment {
                    name: "spec.pdf".into(),
                    stored_ref: r"D:\data\uploads\projects\teamA\spec.pdf".into(),
                    content_type: Some("application/pdf".into()),
                    size_bytes: 1024,
                },
                &uma(),
            )
            .await
            .unwrap();
        let key = engine
            .download_reference::<Project>(project.id, attachment.id)
            .await
            .unwrap();
        assert_eq!(key, "teamA/spec.pdf");

        assert_matches!(
            engine
                .download_reference::<Project>(project.id, crate::types::new_id())
                .await,
            Err(CoreError::NotFound { entity: "Attachment", .. })
        );
    }

    #[tokio::test]
    async fn chat_appends_without_version_checks() {
        let engine = engine();
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();
        let project: Project = engine
            .add_chat_message(project.id, "kick-off on monday", &uma())
            .await
            .unwrap();
        assert_eq!(project.chat.len(), 1);
        assert_eq!(project.chat[0].author_id, "U1");

        // A versioned write after the append still sees the message.
        let project: Project = engine
            .set_health(project.id, Health::AtRisk, &uma())
            .await
            .unwrap();
        assert_eq!(project.chat.len(), 1);

        assert_matches!(
            engine.add_chat_message::<Project>(project.id, "   ", &uma()).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn version_conflicts_are_retried() {
        let store = Arc::new(RacingStore::default());
        let engine = engine_with(store.clone());
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();

        store.races.store(2, Ordering::SeqCst);
        let project: Project = engine
            .set_health(project.id, Health::Delayed, &uma())
            .await
            .unwrap();
        assert_eq!(project.health.value, Health::Delayed);
        assert_eq!(store.updates.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_report_a_conflict() {
        let store = Arc::new(RacingStore::default());
        let engine = engine_with(store.clone());
        let project = engine.create_project(&new_project(), &uma()).await.unwrap();

        store.races.store(10, Ordering::SeqCst);
        let err = engine
            .set_health::<Project>(project.id, Health::Delayed, &uma())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Conflict(ref msg) if msg.contains("modified concurrently"));
    }

    #[tokio::test]
    async fn missing_aggregate_is_not_found() {
        let engine = engine();
        assert_matches!(
            engine.get::<Sprint>(crate::types::new_id()).await,
            Err(CoreError::NotFound { entity: "Sprint", .. })
        );
    }
}
