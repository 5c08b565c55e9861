//! Append-only message threads: deliverable comments and aggregate chat.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{new_id, Actor, EmployeeId, EntityId, Timestamp};

/// Maximum length of a comment or chat message in characters.
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: EntityId,
    pub author_id: EmployeeId,
    pub author_name: String,
    pub message: String,
    pub created_at: Timestamp,
}

/// Comment on a deliverable.
pub type Comment = Message;

/// Chat line on a project or sprint.
pub type ChatMessage = Message;

impl Message {
    /// Build a validated message authored by `actor`.
    pub fn new(message: &str, actor: &Actor, at: Timestamp) -> Result<Self, CoreError> {
        validate_message(message)?;
        Ok(Self {
            id: new_id(),
            author_id: actor.user_id.clone(),
            author_name: actor.name.clone(),
            message: message.trim().to_string(),
            created_at: at,
        })
    }
}

pub fn validate_message(message: &str) -> Result<(), CoreError> {
    if message.trim().is_empty() {
        return Err(CoreError::Validation("message cannot be empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(CoreError::Validation(format!(
            "message exceeds maximum length of {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(())
}
