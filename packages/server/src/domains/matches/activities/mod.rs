//! Match domain activities - business logic functions
//!
//! Mutating activities load rows, run the state machine, commit one
//! changeset, then publish the resulting event to the notification fan-out.
//! They return the event so callers can read the committed rows.

mod lifecycle;
mod queries;
mod requests;

pub use lifecycle::{cancel_match, complete_match, create_match, start_match, update_score};
pub use queries::{get_match, list_match_requests, list_team_matches};
pub use requests::{accept_request, create_request, reject_request, withdraw_request};

use crate::common::{AppError, AppResult, MatchId, MatchRequestId};
use crate::domains::matches::models::{Match, MatchRequest};
use crate::kernel::ServerDeps;

pub(crate) async fn load_match(id: MatchId, deps: &ServerDeps) -> AppResult<Match> {
    deps.store
        .find_match(id)
        .await?
        .ok_or_else(|| AppError::not_found("Match", id))
}

pub(crate) async fn load_request(id: MatchRequestId, deps: &ServerDeps) -> AppResult<MatchRequest> {
    deps.store
        .find_request(id)
        .await?
        .ok_or_else(|| AppError::not_found("MatchRequest", id))
}

/// The row as stored after a successful commit of `next`
pub(crate) fn committed(mut next: Match, original: &Match) -> Match {
    next.lock_version = original.lock_version + 1;
    next
}
