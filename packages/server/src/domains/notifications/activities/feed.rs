use crate::common::{ActorContext, AppError, AppResult, AuthError, NotificationId};
use crate::domains::notifications::models::Notification;
use crate::kernel::ServerDeps;

const MAX_PAGE: i64 = 100;

/// The actor's own feed, newest first
pub async fn list_notifications(
    ctx: &ActorContext,
    unread_only: bool,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> AppResult<Vec<Notification>> {
    if ctx.is_system() {
        return Err(AuthError::AuthenticationRequired.into());
    }
    let limit = limit.unwrap_or(50).clamp(1, MAX_PAGE);
    deps.store
        .notifications_for_user(ctx.actor_id, unread_only, limit)
        .await
}

/// Mark one of the actor's notifications read. Other users' rows look absent.
pub async fn mark_notification_read(
    ctx: &ActorContext,
    id: NotificationId,
    deps: &ServerDeps,
) -> AppResult<Notification> {
    if ctx.is_system() {
        return Err(AuthError::AuthenticationRequired.into());
    }
    deps.store
        .mark_notification_read(id, ctx.actor_id, ctx.now)
        .await?
        .ok_or_else(|| AppError::not_found("Notification", id))
}
