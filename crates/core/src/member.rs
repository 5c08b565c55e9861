//! Membership records embedded in projects and sprints.
//!
//! Members are never physically removed: leaving sets `left_at`, so the list
//! doubles as an append-only membership history.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EmployeeId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberRole {
    Lead,
    Member,
    /// Added automatically when a cross-department employee joins.
    DeptHead,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Member => "member",
            Self::DeptHead => "dept-head",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: EmployeeId,
    pub name: String,
    pub role: MemberRole,
    /// Home department of the member, which may differ from the aggregate's.
    pub department: String,
    pub joined_at: Timestamp,
    pub left_at: Option<Timestamp>,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// The active membership record for `user_id`, if any.
pub fn find_active<'a>(members: &'a [Member], user_id: &str) -> Option<&'a Member> {
    members
        .iter()
        .find(|m| m.is_active() && m.user_id == user_id)
}

pub fn is_active_member(members: &[Member], user_id: &str) -> bool {
    find_active(members, user_id).is_some()
}

/// The current active lead, if any.
pub fn active_lead(members: &[Member]) -> Option<&Member> {
    members
        .iter()
        .find(|m| m.is_active() && m.role == MemberRole::Lead)
}

pub fn active_members(members: &[Member]) -> impl Iterator<Item = &Member> {
    members.iter().filter(|m| m.is_active())
}

/// Mark the active membership of `user_id` as left.
///
/// Fails with `NotFound` when the user never belonged to the aggregate and
/// with `Conflict` when every record of theirs has already been closed.
pub fn mark_left(members: &mut [Member], user_id: &str, at: Timestamp) -> Result<(), CoreError> {
    let known = members.iter().any(|m| m.user_id == user_id);
    match members
        .iter_mut()
        .find(|m| m.is_active() && m.user_id == user_id)
    {
        Some(member) => {
            member.left_at = Some(at);
            Ok(())
        }
        None if known => Err(CoreError::Conflict(format!(
            "member {user_id} has already left"
        ))),
        None => Err(CoreError::not_found("Member", user_id)),
    }
}
