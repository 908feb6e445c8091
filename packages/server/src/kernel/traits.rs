// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Who gets notified about what lives in the domains; these traits only deliver.
//
// Naming convention: Base* for trait names (e.g., BasePushNotificationService)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::AppResult;
use crate::domains::notifications::models::NotificationPayload;
use crate::domains::teams::models::User;

// =============================================================================
// Push Notification Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BasePushNotificationService: Send + Sync {
    /// Send a push notification to a push token
    async fn send_notification(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()>;
}

// =============================================================================
// Notification Dispatcher Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseNotificationDispatcher: Send + Sync {
    /// Deliver one payload to one user over every configured channel.
    ///
    /// Fails with `AppError::Dispatch` only when no channel delivered.
    async fn dispatch(&self, recipient: &User, payload: &NotificationPayload) -> AppResult<()>;
}
