use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::common::{AppResult, NotificationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MatchRequestReceived,
    MatchRequestAccepted,
    MatchRequestRejected,
    MatchRequestWithdrawn,
    MatchCancelled,
    AvailabilityReminder,
}

/// What gets delivered, independent of channel and recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[builder(default)]
    pub action_url: Option<String>,
    #[builder(default)]
    pub icon: Option<String>,
    #[builder(default)]
    pub related_model: Option<String>,
    #[builder(default)]
    pub related_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// In-app feed entry - one row per recipient per payload
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    pub icon: Option<String>,
    pub related_model: Option<String>,
    pub related_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn for_user(user_id: UserId, payload: &NotificationPayload) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind: payload.kind,
            title: payload.title.clone(),
            message: payload.message.clone(),
            action_url: payload.action_url.clone(),
            icon: payload.icon.clone(),
            related_model: payload.related_model.clone(),
            related_id: payload.related_id,
            read_at: None,
            created_at: payload.created_at,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Self> {
        let created = sqlx::query_as::<_, Self>(
            "INSERT INTO notifications (
                id, user_id, kind, title, message, action_url, icon, related_model, related_id, created_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(self.kind)
        .bind(&self.title)
        .bind(&self.message)
        .bind(&self.action_url)
        .bind(&self.icon)
        .bind(&self.related_model)
        .bind(self.related_id)
        .bind(self.created_at)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Newest first
    pub async fn find_for_user<'e>(
        user_id: UserId,
        unread_only: bool,
        limit: i64,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Self>(
            "SELECT * FROM notifications
             WHERE user_id = $1
               AND ($2 = false OR read_at IS NULL)
             ORDER BY created_at DESC, id DESC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(notifications)
    }

    /// Mark read if it belongs to `user_id`. Already-read rows keep their timestamp.
    pub async fn mark_read<'e>(
        id: NotificationId,
        user_id: UserId,
        now: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Option<Self>> {
        let updated = sqlx::query_as::<_, Self>(
            "UPDATE notifications
             SET read_at = COALESCE(read_at, $3)
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(executor)
        .await?;
        Ok(updated)
    }
}
