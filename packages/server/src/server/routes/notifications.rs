use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;

use crate::common::{ActorContext, AppError, NotificationId};
use crate::domains::notifications::activities::{list_notifications, mark_notification_read};
use crate::domains::notifications::models::Notification;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

pub async fn notifications_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    Ok(Json(
        list_notifications(&ctx, query.unread_only, query.limit, &state.deps).await?,
    ))
}

pub async fn mark_read_handler(
    Extension(state): Extension<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<NotificationId>,
) -> Result<Json<Notification>, AppError> {
    let ctx = ActorContext::at_now(auth.user_id);
    Ok(Json(
        mark_notification_read(&ctx, notification_id, &state.deps).await?,
    ))
}
