use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{AppResult, UserId};

/// User - a player or captain who can be notified
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Expo push token; users without one only get in-app notifications
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            push_token: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_push_token(mut self, token: impl Into<String>) -> Self {
        self.push_token = Some(token.into());
        self
    }

    pub async fn find_by_id<'e>(id: UserId, executor: impl PgExecutor<'e>) -> AppResult<Option<Self>> {
        let user = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Self> {
        let user = sqlx::query_as::<_, Self>(
            "INSERT INTO users (id, name, email, push_token, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.push_token)
        .bind(self.created_at)
        .fetch_one(executor)
        .await?;
        Ok(user)
    }
}
