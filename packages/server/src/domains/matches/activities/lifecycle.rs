//! Match lifecycle - create, start, complete, score, cancel

use tracing::info;

use super::{committed, load_match};
use crate::common::{Actor, ActorContext, AppError, AppResult, MatchId, TeamCapability};
use crate::domains::matches::events::MatchEvent;
use crate::domains::matches::machines::{self, MatchTransition};
use crate::domains::matches::models::{Match, MatchRequestStatus, NewMatch};
use crate::domains::notifications::activities::publish_match_event;
use crate::domains::teams::models::TeamMember;
use crate::kernel::store::{MatchChangeset, MatchUpdate};
use crate::kernel::ServerDeps;

const MAX_LOCATION_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 2000;

/// Create an open fixture for the home team. Captains and co-captains only.
pub async fn create_match(input: NewMatch, ctx: &ActorContext, deps: &ServerDeps) -> AppResult<MatchEvent> {
    deps.store
        .find_team(input.home_team_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team", input.home_team_id))?;

    Actor::new(ctx.actor_id)
        .can(TeamCapability::ManageMatches)
        .on_team(input.home_team_id, deps)
        .await?;

    let location = input.location.trim();
    if location.is_empty() {
        return Err(AppError::validation("location is required"));
    }
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(AppError::validation(format!(
            "location must be at most {} characters",
            MAX_LOCATION_LEN
        )));
    }
    if input.notes.as_deref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
        return Err(AppError::validation(format!(
            "notes must be at most {} characters",
            MAX_NOTES_LEN
        )));
    }
    if input.scheduled_at <= ctx.now {
        return Err(AppError::validation("scheduled_at must be in the future"));
    }

    let fixture = deps
        .store
        .insert_match(&Match::open(input, ctx.actor_id, ctx.now))
        .await?;

    info!(
        match_id = %fixture.id,
        home_team_id = %fixture.home_team_id,
        scheduled_at = %fixture.scheduled_at,
        "Match created"
    );

    let event = MatchEvent::MatchCreated { fixture };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

pub async fn start_match(match_id: MatchId, ctx: &ActorContext, deps: &ServerDeps) -> AppResult<MatchEvent> {
    let fixture = transition(match_id, MatchTransition::Start, ctx, deps).await?.0;
    info!(match_id = %fixture.id, "Match started");

    let event = MatchEvent::MatchStarted { fixture };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// Finish an in-progress match. Both scores must be known afterwards.
pub async fn complete_match(
    match_id: MatchId,
    home_score: Option<i32>,
    away_score: Option<i32>,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<MatchEvent> {
    let fixture = transition(
        match_id,
        MatchTransition::Complete {
            home_score,
            away_score,
        },
        ctx,
        deps,
    )
    .await?
    .0;
    info!(match_id = %fixture.id, home_score = ?fixture.home_score, away_score = ?fixture.away_score, "Match completed");

    let event = MatchEvent::MatchCompleted { fixture };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// Record the final score. Completes an in-progress match or corrects a completed one.
pub async fn update_score(
    match_id: MatchId,
    home_score: i32,
    away_score: i32,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<MatchEvent> {
    let (fixture, original) = transition(
        match_id,
        MatchTransition::RecordScore {
            home_score,
            away_score,
        },
        ctx,
        deps,
    )
    .await?;

    let event = if original.status.is_terminal() {
        info!(match_id = %fixture.id, home_score, away_score, "Score corrected");
        MatchEvent::ScoreCorrected { fixture }
    } else {
        info!(match_id = %fixture.id, home_score, away_score, "Match completed with score");
        MatchEvent::MatchCompleted { fixture }
    };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// Cancel a match that has not finished. Pending requests are closed as rejected.
pub async fn cancel_match(match_id: MatchId, ctx: &ActorContext, deps: &ServerDeps) -> AppResult<MatchEvent> {
    let original = load_match(match_id, deps).await?;
    let membership = authorize(&original, ctx, deps).await?;

    let next = machines::apply(&original, MatchTransition::Cancel, ctx.now)
        .map_err(|e| AppError::validation(e.to_string()))?;

    let auto_rejected: Vec<_> = deps
        .store
        .requests_for_match(match_id)
        .await?
        .into_iter()
        .filter(|r| r.is_pending())
        .map(|r| r.reviewed(MatchRequestStatus::Rejected, ctx.actor_id, ctx.now))
        .collect();

    let mut changeset =
        MatchChangeset::new().update_match(MatchUpdate::from_original(&original, next.clone()));
    for request in &auto_rejected {
        changeset = changeset.update_request(request.clone(), MatchRequestStatus::Pending);
    }
    deps.store.commit(changeset).await?;

    let fixture = committed(next, &original);
    info!(
        match_id = %fixture.id,
        cancelled_by_team = %membership.team_id,
        previous_status = %original.status,
        auto_rejected = auto_rejected.len(),
        "Match cancelled"
    );

    let event = MatchEvent::MatchCancelled {
        fixture,
        cancelled_by_team: membership.team_id,
        auto_rejected,
    };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// Home captains may always act; the away team's captains once it is set.
async fn authorize(fixture: &Match, ctx: &ActorContext, deps: &ServerDeps) -> AppResult<TeamMember> {
    Ok(Actor::new(ctx.actor_id)
        .can(TeamCapability::ManageMatches)
        .on_any_team(&fixture.participating_teams(), deps)
        .await?)
}

/// Load, authorize, apply and commit a single-row transition.
///
/// Returns the committed row and the row it replaced.
async fn transition(
    match_id: MatchId,
    transition: MatchTransition,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<(Match, Match)> {
    let original = load_match(match_id, deps).await?;
    authorize(&original, ctx, deps).await?;

    let next = machines::apply(&original, transition, ctx.now)
        .map_err(|e| AppError::validation(e.to_string()))?;

    deps.store
        .commit(MatchChangeset::new().update_match(MatchUpdate::from_original(&original, next.clone())))
        .await?;

    Ok((committed(next, &original), original))
}
