// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::store::{MemoryStore, Store};
use super::{BaseNotificationDispatcher, BasePushNotificationService, ServerDeps};
use crate::common::{AppError, AppResult, UserId};
use crate::domains::availability::ReminderWindow;
use crate::domains::notifications::models::{NotificationKind, NotificationPayload};
use crate::domains::teams::models::User;

// =============================================================================
// Mock Push Notification Service
// =============================================================================

pub struct MockPushNotificationService {
    sent_notifications: Arc<Mutex<Vec<(String, String, String, serde_json::Value)>>>,
    fail_all: bool,
}

impl MockPushNotificationService {
    pub fn new() -> Self {
        Self {
            sent_notifications: Arc::new(Mutex::new(Vec::new())),
            fail_all: false,
        }
    }

    /// A push service whose every send fails
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    /// Get all notifications that were sent
    pub fn sent_notifications(&self) -> Vec<(String, String, String, serde_json::Value)> {
        self.sent_notifications.lock().unwrap().clone()
    }

    /// Check if a notification was sent with the given title
    pub fn was_sent_with_title(&self, title: &str) -> bool {
        self.sent_notifications
            .lock()
            .unwrap()
            .iter()
            .any(|(_, t, _, _)| t == title)
    }
}

impl Default for MockPushNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePushNotificationService for MockPushNotificationService {
    async fn send_notification(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        if self.fail_all {
            anyhow::bail!("push gateway unavailable");
        }
        self.sent_notifications.lock().unwrap().push((
            push_token.to_string(),
            title.to_string(),
            body.to_string(),
            data,
        ));
        Ok(())
    }
}

// =============================================================================
// Mock Notification Dispatcher
// =============================================================================

/// Records every dispatch; can be told to fail for chosen recipients.
pub struct MockNotificationDispatcher {
    dispatched: Arc<Mutex<Vec<(UserId, NotificationPayload)>>>,
    failing_recipients: Arc<Mutex<HashSet<UserId>>>,
}

impl MockNotificationDispatcher {
    pub fn new() -> Self {
        Self {
            dispatched: Arc::new(Mutex::new(Vec::new())),
            failing_recipients: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Every dispatch to `user_id` fails with a dispatch error
    pub fn fail_for(&self, user_id: UserId) {
        self.failing_recipients.lock().unwrap().insert(user_id);
    }

    pub fn recover(&self, user_id: UserId) {
        self.failing_recipients.lock().unwrap().remove(&user_id);
    }

    /// Successful dispatches, in order
    pub fn dispatched(&self) -> Vec<(UserId, NotificationPayload)> {
        self.dispatched.lock().unwrap().clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatched.lock().unwrap().len()
    }

    pub fn recipients_of(&self, kind: NotificationKind) -> Vec<UserId> {
        self.dispatched
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, payload)| payload.kind == kind)
            .map(|(user_id, _)| *user_id)
            .collect()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.recipients_of(kind).len()
    }

    pub fn clear(&self) {
        self.dispatched.lock().unwrap().clear();
    }
}

impl Default for MockNotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseNotificationDispatcher for MockNotificationDispatcher {
    async fn dispatch(&self, recipient: &User, payload: &NotificationPayload) -> AppResult<()> {
        if self.failing_recipients.lock().unwrap().contains(&recipient.id) {
            return Err(AppError::Dispatch(format!(
                "simulated failure for {}",
                recipient.id
            )));
        }
        self.dispatched
            .lock()
            .unwrap()
            .push((recipient.id, payload.clone()));
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<MemoryStore>,
    pub dispatcher: Arc<MockNotificationDispatcher>,
    pub reminder_window: ReminderWindow,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            dispatcher: Arc::new(MockNotificationDispatcher::new()),
            reminder_window: ReminderWindow::default(),
        }
    }

    /// Set a mock dispatcher
    pub fn mock_dispatcher(mut self, dispatcher: MockNotificationDispatcher) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    /// Override the reminder window
    pub fn reminder_window(mut self, window: ReminderWindow) -> Self {
        self.reminder_window = window;
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(self) -> ServerDeps {
        let store: Arc<dyn Store> = self.store;
        ServerDeps::new(
            store,
            self.dispatcher,
            self.reminder_window,
            "https://kickoff.test",
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
