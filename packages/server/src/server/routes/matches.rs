use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::common::{ActorContext, AppError, MatchId, TeamId};
use crate::domains::matches::activities;
use crate::domains::matches::models::{Match, NewMatch};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct CompleteMatchBody {
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
    pub home_score: i32,
    pub away_score: i32,
}

pub async fn create_match_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Json(input): Json<NewMatch>,
) -> Result<(StatusCode, Json<Match>), AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::create_match(input, &ctx, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(event.into_fixture())))
}

pub async fn get_match_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    Ok(Json(activities::get_match(match_id, &ctx, &state.deps).await?))
}

pub async fn team_matches_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(team_id): Path<TeamId>,
) -> Result<Json<Vec<Match>>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    Ok(Json(activities::list_team_matches(team_id, &ctx, &state.deps).await?))
}

pub async fn start_match_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::start_match(match_id, &ctx, &state.deps).await?;
    Ok(Json(event.into_fixture()))
}

/// Body is optional when the score was already recorded
pub async fn complete_match_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
    body: Option<Json<CompleteMatchBody>>,
) -> Result<Json<Match>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let (home_score, away_score) = body
        .map(|Json(b)| (b.home_score, b.away_score))
        .unwrap_or((None, None));
    let event =
        activities::complete_match(match_id, home_score, away_score, &ctx, &state.deps).await?;
    Ok(Json(event.into_fixture()))
}

pub async fn update_score_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
    Json(body): Json<ScoreBody>,
) -> Result<Json<Match>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::update_score(
        match_id,
        body.home_score,
        body.away_score,
        &ctx,
        &state.deps,
    )
    .await?;
    Ok(Json(event.into_fixture()))
}

pub async fn cancel_match_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::cancel_match(match_id, &ctx, &state.deps).await?;
    Ok(Json(event.into_fixture()))
}
