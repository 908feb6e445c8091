use anyhow::Result;
use async_trait::async_trait;

use super::{AuthError, TeamCapability};
use crate::common::entity_ids::{TeamId, UserId};
use crate::domains::teams::models::TeamMember;

/// Entry point for authorization checks
///
/// Usage:
/// ```ignore
/// let membership = Actor::new(ctx.actor_id)
///     .can(TeamCapability::ManageMatches)
///     .on_team(fixture.home_team_id, deps)
///     .await?;
/// ```
pub struct Actor {
    actor_id: UserId,
}

impl Actor {
    pub fn new(actor_id: UserId) -> Self {
        Self { actor_id }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: TeamCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor_id: self.actor_id,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor_id: UserId,
    capability: TeamCapability,
}

impl CapabilityBuilder {
    /// Require the capability on one team. Returns the actor's membership.
    pub async fn on_team<D>(self, team_id: TeamId, deps: &D) -> Result<TeamMember, AuthError>
    where
        D: HasAuthContext + ?Sized,
    {
        check_team_permission(self.actor_id, team_id, self.capability, deps).await
    }

    /// Require the capability on at least one of `teams`, checked in order.
    ///
    /// When every team refuses, the error for the first team is returned.
    pub async fn on_any_team<D>(
        self,
        teams: &[TeamId],
        deps: &D,
    ) -> Result<TeamMember, AuthError>
    where
        D: HasAuthContext + ?Sized,
    {
        let mut first_error = None;
        for team_id in teams {
            match check_team_permission(self.actor_id, *team_id, self.capability, deps).await {
                Ok(membership) => return Ok(membership),
                Err(AuthError::InternalError(e)) => return Err(AuthError::InternalError(e)),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error
            .unwrap_or_else(|| AuthError::PermissionDenied("no team to authorize against".into())))
    }
}

/// Answers membership questions for authorization checks
#[async_trait]
pub trait HasAuthContext: Send + Sync {
    async fn membership(&self, team_id: TeamId, user_id: UserId) -> Result<Option<TeamMember>>;
}

async fn check_team_permission<D>(
    actor_id: UserId,
    team_id: TeamId,
    capability: TeamCapability,
    deps: &D,
) -> Result<TeamMember, AuthError>
where
    D: HasAuthContext + ?Sized,
{
    if actor_id.is_nil() {
        return Err(AuthError::AuthenticationRequired);
    }

    let membership = deps
        .membership(team_id, actor_id)
        .await?
        .filter(|m| m.is_active())
        .ok_or(AuthError::NotTeamMember { team_id })?;

    if !capability.permits(membership.role) {
        return Err(AuthError::CaptainRequired { team_id });
    }

    Ok(membership)
}
