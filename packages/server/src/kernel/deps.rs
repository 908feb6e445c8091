//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! activities. Persistence and notification delivery are trait objects so
//! tests can swap in the in-memory store and a recording dispatcher.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::common::auth::HasAuthContext;
use crate::common::{TeamId, UserId};
use crate::domains::availability::ReminderWindow;
use crate::domains::teams::models::TeamMember;
use crate::kernel::store::Store;
use crate::kernel::BaseNotificationDispatcher;

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn Store>,
    pub dispatcher: Arc<dyn BaseNotificationDispatcher>,
    /// Which kickoffs the reminder run picks up
    pub reminder_window: ReminderWindow,
    /// Prefix for `action_url` links in notifications
    pub app_base_url: String,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn Store>,
        dispatcher: Arc<dyn BaseNotificationDispatcher>,
        reminder_window: ReminderWindow,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            reminder_window,
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute link into the app for a path like `/matches/{id}`
    pub fn action_url(&self, path: &str) -> String {
        format!("{}{}", self.app_base_url, path)
    }
}

/// Implement HasAuthContext for ServerDeps to enable authorization checks
#[async_trait]
impl HasAuthContext for ServerDeps {
    async fn membership(&self, team_id: TeamId, user_id: UserId) -> Result<Option<TeamMember>> {
        Ok(self.store.find_membership(team_id, user_id).await?)
    }
}
