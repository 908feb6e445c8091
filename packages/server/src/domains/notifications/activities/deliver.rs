use futures::future::join_all;
use tracing::warn;

use crate::common::UserId;
use crate::domains::notifications::models::NotificationPayload;
use crate::kernel::ServerDeps;

/// Outcome of delivering one payload to a set of users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Deliver `payload` to every recipient concurrently. A failure for one
/// recipient is logged and does not stop the others.
pub async fn notify_users(
    recipients: &[UserId],
    payload: &NotificationPayload,
    deps: &ServerDeps,
) -> DeliveryReport {
    let outcomes = join_all(recipients.iter().map(|user_id| deliver_one(*user_id, payload, deps))).await;

    let delivered = outcomes.iter().filter(|ok| **ok).count();
    DeliveryReport {
        delivered,
        failed: outcomes.len() - delivered,
    }
}

async fn deliver_one(user_id: UserId, payload: &NotificationPayload, deps: &ServerDeps) -> bool {
    let user = match deps.store.find_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(user_id = %user_id, kind = ?payload.kind, "Notification recipient not found");
            return false;
        }
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Failed to load notification recipient");
            return false;
        }
    };

    match deps.dispatcher.dispatch(&user, payload).await {
        Ok(()) => true,
        Err(e) => {
            warn!(user_id = %user_id, kind = ?payload.kind, error = %e, "Notification dispatch failed");
            false
        }
    }
}
