use thiserror::Error;

use crate::common::TeamId;

/// Authorization errors for team-scoped match actions
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Not an active member of team {team_id}")]
    NotTeamMember { team_id: TeamId },

    #[error("Team {team_id} captain or co-captain required")]
    CaptainRequired { team_id: TeamId },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
