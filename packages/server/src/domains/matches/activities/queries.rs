use std::collections::BTreeSet;

use super::load_match;
use crate::common::{
    Actor, ActorContext, AppResult, AuthError, MatchId, TeamCapability, TeamId,
};
use crate::domains::matches::models::{Match, MatchRequest};
use crate::kernel::ServerDeps;

/// Any signed-in user may look at a fixture; open matches are meant to be found.
pub async fn get_match(match_id: MatchId, ctx: &ActorContext, deps: &ServerDeps) -> AppResult<Match> {
    if ctx.is_system() {
        return Err(AuthError::AuthenticationRequired.into());
    }
    load_match(match_id, deps).await
}

/// Home and away fixtures of a team, for its active members
pub async fn list_team_matches(team_id: TeamId, ctx: &ActorContext, deps: &ServerDeps) -> AppResult<Vec<Match>> {
    Actor::new(ctx.actor_id)
        .can(TeamCapability::RespondToMatch)
        .on_team(team_id, deps)
        .await?;

    deps.store.matches_for_team(team_id).await
}

/// Requests for a match.
///
/// Home captains see every request; a requesting team's captains see only
/// their own team's.
pub async fn list_match_requests(
    match_id: MatchId,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<Vec<MatchRequest>> {
    let fixture = load_match(match_id, deps).await?;
    let requests = deps.store.requests_for_match(match_id).await?;

    let home_check = Actor::new(ctx.actor_id)
        .can(TeamCapability::ManageMatches)
        .on_team(fixture.home_team_id, deps)
        .await;
    let home_error = match home_check {
        Ok(_) => return Ok(requests),
        Err(AuthError::InternalError(e)) => return Err(AuthError::InternalError(e).into()),
        Err(e) => e,
    };

    let requesting_teams: BTreeSet<TeamId> = requests.iter().map(|r| r.requesting_team_id).collect();
    let mut visible_teams = BTreeSet::new();
    for team_id in requesting_teams {
        let check = Actor::new(ctx.actor_id)
            .can(TeamCapability::ManageMatches)
            .on_team(team_id, deps)
            .await;
        match check {
            Ok(_) => {
                visible_teams.insert(team_id);
            }
            Err(AuthError::InternalError(e)) => return Err(AuthError::InternalError(e).into()),
            Err(_) => {}
        }
    }

    if visible_teams.is_empty() {
        return Err(home_error.into());
    }

    Ok(requests
        .into_iter()
        .filter(|r| visible_teams.contains(&r.requesting_team_id))
        .collect())
}
