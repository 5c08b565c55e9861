//! Domain error type shared by every layer above `core`.

use crate::types::EntityId;

/// Coarse classification of a [`CoreError`].
///
/// Callers use this to decide whether to retry, surface to a user, or treat
/// the outcome as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationFailed,
    NotFound,
    Conflict,
    DependencyUnavailable,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("cannot move {entity} from {from} to {to}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("blocker {blocker_id} not found")]
    BlockerNotFound { blocker_id: EntityId },

    #[error("department of employee {employee_id} could not be resolved")]
    DirectoryLookupFailed { employee_id: String },

    #[error("invalid attachment reference: {0}")]
    InvalidAttachmentReference(String),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] keyed by an entity id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidAttachmentReference(_) => {
                ErrorKind::ValidationFailed
            }
            Self::NotFound { .. }
            | Self::BlockerNotFound { .. }
            | Self::DirectoryLookupFailed { .. } => ErrorKind::NotFound,
            Self::Conflict(_) | Self::IllegalTransition { .. } => ErrorKind::Conflict,
            Self::DependencyUnavailable(_) => ErrorKind::DependencyUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only an unreachable collaborator is worth retrying automatically.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::DependencyUnavailable
    }
}
