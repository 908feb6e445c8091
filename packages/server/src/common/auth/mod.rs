/// Authorization module
///
/// Provides a fluent API for team-scoped authorization checks in activities:
///
/// ```ignore
/// use crate::common::auth::{Actor, TeamCapability};
///
/// Actor::new(ctx.actor_id)
///     .can(TeamCapability::ManageMatches)
///     .on_team(fixture.home_team_id, deps)
///     .await?;
/// ```
///
/// Checks live in the activity layer, next to the state change they guard,
/// not in the HTTP handlers.

mod builder;
mod capability;
mod errors;

pub use builder::{Actor, CapabilityBuilder, HasAuthContext};
pub use capability::TeamCapability;
pub use errors::AuthError;
