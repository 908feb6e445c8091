use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;

use crate::common::{ActorContext, AppError, MatchId, TeamId};
use crate::domains::availability::activities::{
    match_availability_summary, respond_to_match, AvailabilitySummary,
};
use crate::domains::availability::models::{AvailabilityStatus, MatchAvailability};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub team_id: TeamId,
    pub status: AvailabilityStatus,
}

pub async fn availability_summary_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<AvailabilitySummary>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    Ok(Json(match_availability_summary(match_id, &ctx, &state.deps).await?))
}

pub async fn respond_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
    Json(body): Json<RespondBody>,
) -> Result<Json<MatchAvailability>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    Ok(Json(
        respond_to_match(match_id, body.team_id, body.status, &ctx, &state.deps).await?,
    ))
}
