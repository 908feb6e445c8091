use serde::Serialize;
use tracing::info;

use super::records::{ensure_exists, update_status};
use crate::common::{Actor, ActorContext, AppError, AppResult, MatchId, TeamCapability, TeamId};
use crate::domains::availability::models::{AvailabilityStatus, MatchAvailability};
use crate::domains::matches::activities::get_match;
use crate::kernel::ServerDeps;

/// A player answers whether they can play `match_id` for `team_id`.
pub async fn respond_to_match(
    match_id: MatchId,
    team_id: TeamId,
    status: AvailabilityStatus,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<MatchAvailability> {
    let fixture = get_match(match_id, ctx, deps).await?;

    if !fixture.is_participant(team_id) {
        return Err(AppError::validation(format!(
            "team {} does not play in match {}",
            team_id, match_id
        )));
    }

    Actor::new(ctx.actor_id)
        .can(TeamCapability::RespondToMatch)
        .on_team(team_id, deps)
        .await?;

    if fixture.status.is_terminal() {
        return Err(AppError::validation(format!(
            "match is {}, availability is closed",
            fixture.status
        )));
    }
    if status == AvailabilityStatus::Pending {
        return Err(AppError::validation(
            "answer must be available, maybe or unavailable",
        ));
    }

    let (record, _) = ensure_exists(match_id, ctx.actor_id, team_id, ctx.now, deps).await?;
    let updated = update_status(&record, status, ctx.now, deps).await?;

    info!(
        match_id = %match_id,
        user_id = %ctx.actor_id,
        team_id = %team_id,
        status = ?updated.status,
        "Availability updated"
    );
    Ok(updated)
}

/// Counts for one side of a match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamAvailability {
    pub team_id: TeamId,
    pub available: usize,
    pub maybe: usize,
    pub unavailable: usize,
    /// Records created but not answered yet
    pub pending: usize,
    /// Active members with no record at all
    pub no_response: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilitySummary {
    pub match_id: MatchId,
    pub teams: Vec<TeamAvailability>,
    pub responses: Vec<MatchAvailability>,
}

/// Who is coming, per participating team. Visible to members of either side.
pub async fn match_availability_summary(
    match_id: MatchId,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<AvailabilitySummary> {
    let fixture = get_match(match_id, ctx, deps).await?;

    Actor::new(ctx.actor_id)
        .can(TeamCapability::RespondToMatch)
        .on_any_team(&fixture.participating_teams(), deps)
        .await?;

    let responses = deps.store.availability_for_match(match_id).await?;

    let mut teams = Vec::new();
    for team_id in fixture.participating_teams() {
        let mut counts = TeamAvailability {
            team_id,
            ..Default::default()
        };

        let team_records: Vec<&MatchAvailability> =
            responses.iter().filter(|r| r.team_id == team_id).collect();
        for record in &team_records {
            match record.status {
                AvailabilityStatus::Available => counts.available += 1,
                AvailabilityStatus::Maybe => counts.maybe += 1,
                AvailabilityStatus::Unavailable => counts.unavailable += 1,
                AvailabilityStatus::Pending => counts.pending += 1,
            }
        }

        counts.no_response = deps
            .store
            .active_members(team_id)
            .await?
            .iter()
            .filter(|m| !team_records.iter().any(|r| r.user_id == m.user_id))
            .count();

        teams.push(counts);
    }

    Ok(AvailabilitySummary {
        match_id,
        teams,
        responses,
    })
}
