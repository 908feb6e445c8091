//! Channel dispatcher - delivers one payload to one user over every channel.
//!
//! Channels:
//! - database feed (always)
//! - Expo push (when enabled and the user has a push token)
//!
//! A recipient counts as failed only when every attempted channel failed.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::{AppError, AppResult};
use crate::domains::notifications::models::{Notification, NotificationPayload};
use crate::domains::teams::models::User;
use crate::kernel::store::Store;
use crate::kernel::{BaseNotificationDispatcher, BasePushNotificationService};

pub struct ChannelDispatcher {
    store: Arc<dyn Store>,
    push: Option<Arc<dyn BasePushNotificationService>>,
}

impl ChannelDispatcher {
    /// Feed-only dispatcher
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, push: None }
    }

    pub fn with_push(mut self, push: Arc<dyn BasePushNotificationService>) -> Self {
        self.push = Some(push);
        self
    }

    fn push_data(payload: &NotificationPayload) -> serde_json::Value {
        json!({
            "type": payload.kind,
            "action_url": payload.action_url,
            "related_model": payload.related_model,
            "related_id": payload.related_id,
        })
    }
}

#[async_trait]
impl BaseNotificationDispatcher for ChannelDispatcher {
    async fn dispatch(&self, recipient: &User, payload: &NotificationPayload) -> AppResult<()> {
        let mut attempted = 0;
        let mut failures = Vec::new();

        attempted += 1;
        let row = Notification::for_user(recipient.id, payload);
        if let Err(e) = self.store.insert_notification(&row).await {
            warn!(user_id = %recipient.id, error = %e, "Feed channel failed");
            failures.push(format!("feed: {}", e));
        }

        match (&self.push, recipient.push_token.as_deref()) {
            (Some(push), Some(token)) => {
                attempted += 1;
                if let Err(e) = push
                    .send_notification(token, &payload.title, &payload.message, Self::push_data(payload))
                    .await
                {
                    warn!(user_id = %recipient.id, error = %e, "Push channel failed");
                    failures.push(format!("push: {}", e));
                }
            }
            (Some(_), None) => debug!(user_id = %recipient.id, "No push token, feed only"),
            (None, _) => {}
        }

        if failures.len() == attempted {
            return Err(AppError::Dispatch(failures.join("; ")));
        }
        Ok(())
    }
}
