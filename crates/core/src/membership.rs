//! Membership composition: who joins an aggregate when someone is added.
//!
//! Adding an employee from another department also admits the head of that
//! employee's department as a `dept-head` member. Escalation is one level
//! only; the head's own home department is never looked at.
//!
//! The work is split in two so the version-checked write loop stays
//! synchronous:
//!
//! 1. [`lookup_candidate`] asks the directory about the candidate (async).
//! 2. [`compose`] decides the members to append against the current member
//!    list (pure, re-run on every write attempt).

use serde::Serialize;

use crate::aggregate::AggregateKind;
use crate::directory::{DepartmentHead, DirectoryLookup, Employee};
use crate::error::CoreError;
use crate::member::{self, Member, MemberRole};
use crate::types::{EmployeeId, Timestamp};

/// Directory facts about a candidate, gathered before composing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub employee: Employee,
    /// Head of the candidate's department. Only looked up for
    /// cross-department candidates.
    pub head: Option<DepartmentHead>,
}

/// What happened to department-head escalation for one addition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Escalation {
    /// Candidate belongs to the aggregate's department.
    NotRequired,
    /// The head was appended with role `dept-head`.
    Added { head_id: EmployeeId },
    HeadAlreadyMember { head_id: EmployeeId },
    /// The candidate heads their own department.
    CandidateIsHead,
    NoHeadFound { department: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    /// The candidate is already active; nothing to do.
    AlreadyMember,
    Admit {
        members: Vec<Member>,
        escalation: Escalation,
    },
}

/// Resolve the candidate's department and, when it differs from
/// `aggregate_department`, that department's head.
///
/// An unknown candidate (or one without a department) fails closed with
/// `DirectoryLookupFailed`; an unreachable directory is
/// `DependencyUnavailable`.
pub async fn lookup_candidate(
    directory: &dyn DirectoryLookup,
    aggregate_department: &str,
    candidate_id: &str,
) -> Result<Candidate, CoreError> {
    let employee = directory
        .employee(candidate_id)
        .await?
        .filter(|e| !e.department.trim().is_empty())
        .ok_or_else(|| CoreError::DirectoryLookupFailed {
            employee_id: candidate_id.to_string(),
        })?;

    let head = if employee.department == aggregate_department {
        None
    } else {
        directory.department_head(&employee.department).await?
    };

    Ok(Candidate { employee, head })
}

/// Role the candidate joins with.
///
/// `dept-head` is assigned by escalation only. Without an explicit request a
/// project that has no active lead gets one; everything else joins as
/// `member`.
pub fn resolve_role(
    kind: AggregateKind,
    members: &[Member],
    requested: Option<MemberRole>,
) -> Result<MemberRole, CoreError> {
    let has_lead = member::active_lead(members).is_some();
    match requested {
        Some(MemberRole::DeptHead) => Err(CoreError::Validation(
            "dept-head role is assigned automatically and cannot be requested".into(),
        )),
        Some(MemberRole::Lead) if has_lead => Err(CoreError::Conflict(format!(
            "{} already has an active lead",
            kind.as_str()
        ))),
        Some(role) => Ok(role),
        None if kind == AggregateKind::Project && !has_lead => Ok(MemberRole::Lead),
        None => Ok(MemberRole::Member),
    }
}

/// Compute the members to append when `candidate` joins.
pub fn compose(
    kind: AggregateKind,
    department: &str,
    members: &[Member],
    candidate: &Candidate,
    requested_role: Option<MemberRole>,
    at: Timestamp,
) -> Result<Composition, CoreError> {
    let employee = &candidate.employee;
    if member::is_active_member(members, &employee.id) {
        return Ok(Composition::AlreadyMember);
    }

    let role = resolve_role(kind, members, requested_role)?;
    let mut admitted = vec![Member {
        user_id: employee.id.clone(),
        name: employee.name.clone(),
        role,
        department: employee.department.clone(),
        joined_at: at,
        left_at: None,
    }];

    let escalation = if employee.department == department {
        Escalation::NotRequired
    } else {
        match &candidate.head {
            None => Escalation::NoHeadFound {
                department: employee.department.clone(),
            },
            Some(head) if head.user_id == employee.id => Escalation::CandidateIsHead,
            Some(head) if member::is_active_member(members, &head.user_id) => {
                Escalation::HeadAlreadyMember {
                    head_id: head.user_id.clone(),
                }
            }
            Some(head) => {
                admitted.push(Member {
                    user_id: head.user_id.clone(),
                    name: head.name.clone(),
                    role: MemberRole::DeptHead,
                    department: employee.department.clone(),
                    joined_at: at,
                    left_at: None,
                });
                Escalation::Added {
                    head_id: head.user_id.clone(),
                }
            }
        }
    };

    Ok(Composition::Admit {
        members: admitted,
        escalation,
    })
}

/// Close the membership of `user_id`.
///
/// The lead of an active aggregate cannot leave; reassign the lead first.
/// Escalated heads stay when the member who brought them in leaves.
pub fn remove_member(
    members: &mut [Member],
    user_id: &str,
    aggregate_active: bool,
    at: Timestamp,
) -> Result<(), CoreError> {
    if aggregate_active {
        if let Some(lead) = member::active_lead(members) {
            if lead.user_id == user_id {
                return Err(CoreError::Conflict(format!(
                    "member {user_id} is the lead; reassign the lead before removing them"
                )));
            }
        }
    }
    member::mark_left(members, user_id, at)
}

/// Make `new_lead_id` the lead, demoting the previous lead to `member`.
///
/// Returns the previous lead's id, if there was one.
pub fn reassign_lead(
    members: &mut [Member],
    new_lead_id: &str,
) -> Result<Option<EmployeeId>, CoreError> {
    let Some(target) = member::find_active(members, new_lead_id) else {
        return Err(if members.iter().any(|m| m.user_id == new_lead_id) {
            CoreError::Conflict(format!("member {new_lead_id} has already left"))
        } else {
            CoreError::not_found("Member", new_lead_id)
        });
    };
    if target.role == MemberRole::Lead {
        return Err(CoreError::Conflict(format!(
            "member {new_lead_id} is already the lead"
        )));
    }

    let mut previous = None;
    for m in members.iter_mut().filter(|m| m.is_active()) {
        if m.role == MemberRole::Lead {
            m.role = MemberRole::Member;
            previous = Some(m.user_id.clone());
        } else if m.user_id == new_lead_id {
            m.role = MemberRole::Lead;
        }
    }
    Ok(previous)
}
