use thiserror::Error;
use uuid::Uuid;

use super::auth::AuthError;
use super::Id;

/// Errors surfaced by match, request and availability operations.
///
/// Everything except `Dispatch` aborts the enclosing transaction. `Dispatch`
/// is only produced on a single recipient's send path and is logged there.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Authorization(#[from] AuthError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Notification dispatch failed: {0}")]
    Dispatch(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found<T, V>(entity: &'static str, id: Id<T, V>) -> Self {
        Self::NotFound {
            entity,
            id: id.into_uuid(),
        }
    }

    /// Conflicts are stale-state races: re-fetch and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Authorization(AuthError::AuthenticationRequired)
            | Self::Authorization(AuthError::InvalidToken) => "authentication_error",
            Self::Authorization(AuthError::InternalError(_)) => "internal_error",
            Self::Authorization(_) => "authorization_error",
            Self::Conflict(_) => "conflict_error",
            Self::NotFound { .. } => "not_found_error",
            Self::Dispatch(_) => "dispatch_error",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{MatchId, TeamId};

    #[test]
    fn not_found_reports_entity_and_id() {
        let id = MatchId::new();
        let err = AppError::not_found("Match", id);
        assert_eq!(err.to_string(), format!("Match not found: {}", id));
        assert_eq!(err.kind(), "not_found_error");
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(AppError::conflict("stale").is_retryable());
        assert!(!AppError::validation("bad").is_retryable());
        assert!(!AppError::Dispatch("push down".into()).is_retryable());
    }

    #[test]
    fn auth_errors_keep_their_message() {
        let err: AppError = AuthError::CaptainRequired {
            team_id: TeamId::nil(),
        }
        .into();
        assert_eq!(err.kind(), "authorization_error");
        assert!(err.to_string().contains("captain"));
    }
}
