//! Match request workflow - create, accept, reject, withdraw
//!
//! Every write bumps the match row's lock version, so two reviews of the same
//! match cannot both commit. The loser sees a conflict and should re-read.

use tracing::{info, warn};

use super::{committed, load_match, load_request};
use crate::common::{
    Actor, ActorContext, AppError, AppResult, MatchId, MatchRequestId, TeamCapability, TeamId,
};
use crate::domains::matches::events::MatchEvent;
use crate::domains::matches::machines::{self, MatchTransition, TransitionError};
use crate::domains::matches::models::{Match, MatchRequest, MatchRequestStatus};
use crate::domains::notifications::activities::publish_match_event;
use crate::kernel::store::{MatchChangeset, MatchUpdate};
use crate::kernel::ServerDeps;

const MAX_MESSAGE_LEN: usize = 1000;
const NO_LONGER_AVAILABLE: &str = "match request is no longer available";

/// Stale state in the request workflow is a conflict, not bad input.
fn stale(err: TransitionError) -> AppError {
    match err {
        TransitionError::NotAllowed { .. } => AppError::conflict(err.to_string()),
        other => AppError::validation(other.to_string()),
    }
}

fn no_longer_available(err: AppError) -> AppError {
    match err {
        AppError::Conflict(reason) => {
            warn!(reason = %reason, "Request workflow lost a race");
            AppError::conflict(NO_LONGER_AVAILABLE)
        }
        other => other,
    }
}

/// Ask to fill the away slot of an open match on behalf of `requesting_team_id`.
pub async fn create_request(
    match_id: MatchId,
    requesting_team_id: TeamId,
    message: Option<String>,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<MatchEvent> {
    let original = load_match(match_id, deps).await?;
    deps.store
        .find_team(requesting_team_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team", requesting_team_id))?;

    Actor::new(ctx.actor_id)
        .can(TeamCapability::ManageMatches)
        .on_team(requesting_team_id, deps)
        .await?;

    if requesting_team_id == original.home_team_id {
        return Err(AppError::validation("a team cannot request its own match"));
    }

    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());
    if message.as_ref().is_some_and(|m| m.chars().count() > MAX_MESSAGE_LEN) {
        return Err(AppError::validation(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_LEN
        )));
    }

    let next = machines::apply(&original, MatchTransition::RequestReceived, ctx.now).map_err(stale)?;

    let already_pending = deps
        .store
        .requests_for_match(match_id)
        .await?
        .iter()
        .any(|r| r.requesting_team_id == requesting_team_id && r.is_pending());
    if already_pending {
        return Err(AppError::conflict(
            "this team already has a pending request for the match",
        ));
    }

    let request = MatchRequest::pending(match_id, requesting_team_id, ctx.actor_id, message, ctx.now);
    deps.store
        .commit(
            MatchChangeset::new()
                .update_match(MatchUpdate::from_original(&original, next.clone()))
                .insert_request(request.clone()),
        )
        .await?;

    let fixture = committed(next, &original);
    info!(
        match_id = %fixture.id,
        request_id = %request.id,
        requesting_team_id = %requesting_team_id,
        "Match request created"
    );

    let event = MatchEvent::RequestCreated { fixture, request };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// Accept a pending request. The match is confirmed against the requesting
/// team and every other pending request is rejected in the same commit.
pub async fn accept_request(
    request_id: MatchRequestId,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<MatchEvent> {
    let request = load_request(request_id, deps).await?;
    let original = load_match(request.match_id, deps).await?;

    Actor::new(ctx.actor_id)
        .can(TeamCapability::ManageMatches)
        .on_team(original.home_team_id, deps)
        .await?;

    if !request.is_pending() {
        return Err(AppError::conflict(NO_LONGER_AVAILABLE));
    }

    let next = machines::apply(
        &original,
        MatchTransition::Accept {
            away_team_id: request.requesting_team_id,
        },
        ctx.now,
    )
    .map_err(stale)?;

    let accepted = request.reviewed(MatchRequestStatus::Accepted, ctx.actor_id, ctx.now);
    let auto_rejected: Vec<MatchRequest> = deps
        .store
        .requests_for_match(original.id)
        .await?
        .into_iter()
        .filter(|r| r.id != request.id && r.is_pending())
        .map(|r| r.reviewed(MatchRequestStatus::Rejected, ctx.actor_id, ctx.now))
        .collect();

    let mut changeset = MatchChangeset::new()
        .update_match(MatchUpdate::from_original(&original, next.clone()))
        .update_request(accepted.clone(), MatchRequestStatus::Pending);
    for other in &auto_rejected {
        changeset = changeset.update_request(other.clone(), MatchRequestStatus::Pending);
    }
    deps.store.commit(changeset).await.map_err(no_longer_available)?;

    let fixture = committed(next, &original);
    info!(
        match_id = %fixture.id,
        request_id = %accepted.id,
        away_team_id = %accepted.requesting_team_id,
        auto_rejected = auto_rejected.len(),
        "Match request accepted, match confirmed"
    );

    let event = MatchEvent::RequestAccepted {
        fixture,
        request: accepted,
        auto_rejected,
    };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// Reject a pending request. The match reopens when no other request is pending.
pub async fn reject_request(
    request_id: MatchRequestId,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<MatchEvent> {
    let request = load_request(request_id, deps).await?;
    let original = load_match(request.match_id, deps).await?;

    Actor::new(ctx.actor_id)
        .can(TeamCapability::ManageMatches)
        .on_team(original.home_team_id, deps)
        .await?;

    let (fixture, rejected) =
        close_request(&original, &request, MatchRequestStatus::Rejected, ctx, deps).await?;
    info!(
        match_id = %fixture.id,
        request_id = %rejected.id,
        match_status = %fixture.status,
        "Match request rejected"
    );

    let event = MatchEvent::RequestRejected {
        fixture,
        request: rejected,
    };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// The requesting team takes back its own pending request.
pub async fn withdraw_request(
    request_id: MatchRequestId,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<MatchEvent> {
    let request = load_request(request_id, deps).await?;
    let original = load_match(request.match_id, deps).await?;

    Actor::new(ctx.actor_id)
        .can(TeamCapability::ManageMatches)
        .on_team(request.requesting_team_id, deps)
        .await?;

    let (fixture, withdrawn) =
        close_request(&original, &request, MatchRequestStatus::Withdrawn, ctx, deps).await?;
    info!(
        match_id = %fixture.id,
        request_id = %withdrawn.id,
        match_status = %fixture.status,
        "Match request withdrawn"
    );

    let event = MatchEvent::RequestWithdrawn {
        fixture,
        request: withdrawn,
    };
    publish_match_event(&event, ctx, deps).await;
    Ok(event)
}

/// Close `request` with `outcome`, reopening the match if it was the last
/// pending one. The match row is always rewritten so the lock version moves.
async fn close_request(
    original: &Match,
    request: &MatchRequest,
    outcome: MatchRequestStatus,
    ctx: &ActorContext,
    deps: &ServerDeps,
) -> AppResult<(Match, MatchRequest)> {
    if !request.is_pending() {
        return Err(AppError::conflict(NO_LONGER_AVAILABLE));
    }

    let others_pending = deps
        .store
        .requests_for_match(original.id)
        .await?
        .iter()
        .any(|r| r.id != request.id && r.is_pending());

    let next = if others_pending {
        let mut touched = original.clone();
        touched.updated_at = ctx.now;
        touched
    } else {
        machines::apply(original, MatchTransition::Reopen, ctx.now).map_err(stale)?
    };

    let closed = request.reviewed(outcome, ctx.actor_id, ctx.now);
    deps.store
        .commit(
            MatchChangeset::new()
                .update_match(MatchUpdate::from_original(original, next.clone()))
                .update_request(closed.clone(), MatchRequestStatus::Pending),
        )
        .await
        .map_err(no_longer_available)?;

    Ok((committed(next, original), closed))
}
