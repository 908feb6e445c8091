use crate::domains::teams::models::TeamRole;

/// Team-scoped capabilities checked before match workflow actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamCapability {
    /// Create matches, review requests, start/complete/cancel, record scores
    ManageMatches,

    /// Confirm or decline attendance for a match the team plays in
    RespondToMatch,
}

impl TeamCapability {
    /// Whether an active member holding `role` has this capability
    pub fn permits(&self, role: TeamRole) -> bool {
        match self {
            TeamCapability::ManageMatches => role.is_captain(),
            TeamCapability::RespondToMatch => true,
        }
    }
}
