use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::{ActorContext, AppError, MatchId, MatchRequestId, TeamId};
use crate::domains::matches::activities;
use crate::domains::matches::models::{Match, MatchRequest};
use crate::domains::matches::MatchEvent;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub requesting_team_id: TeamId,
    #[serde(default)]
    pub message: Option<String>,
}

/// Match and request as committed by a workflow step
#[derive(Debug, Serialize)]
pub struct RequestOutcome {
    #[serde(rename = "match")]
    pub fixture: Match,
    pub request: MatchRequest,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auto_rejected: Vec<MatchRequest>,
}

impl TryFrom<MatchEvent> for RequestOutcome {
    type Error = AppError;

    fn try_from(event: MatchEvent) -> Result<Self, Self::Error> {
        match event {
            MatchEvent::RequestAccepted {
                fixture,
                request,
                auto_rejected,
            } => Ok(Self {
                fixture,
                request,
                auto_rejected,
            }),
            MatchEvent::RequestCreated { fixture, request }
            | MatchEvent::RequestRejected { fixture, request }
            | MatchEvent::RequestWithdrawn { fixture, request } => Ok(Self {
                fixture,
                request,
                auto_rejected: Vec::new(),
            }),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "not a request event for match {}",
                other.fixture().id
            ))),
        }
    }
}

pub async fn create_request_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestOutcome>), AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::create_request(
        match_id,
        body.requesting_team_id,
        body.message,
        &ctx,
        &state.deps,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(event.try_into()?)))
}

pub async fn list_requests_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Vec<MatchRequest>>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    Ok(Json(activities::list_match_requests(match_id, &ctx, &state.deps).await?))
}

pub async fn accept_request_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(request_id): Path<MatchRequestId>,
) -> Result<Json<RequestOutcome>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::accept_request(request_id, &ctx, &state.deps).await?;
    Ok(Json(event.try_into()?))
}

pub async fn reject_request_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(request_id): Path<MatchRequestId>,
) -> Result<Json<RequestOutcome>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::reject_request(request_id, &ctx, &state.deps).await?;
    Ok(Json(event.try_into()?))
}

pub async fn withdraw_request_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(request_id): Path<MatchRequestId>,
) -> Result<Json<RequestOutcome>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    let event = activities::withdraw_request(request_id, &ctx, &state.deps).await?;
    Ok(Json(event.try_into()?))
}
