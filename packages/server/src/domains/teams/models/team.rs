use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{AppResult, TeamId, UserId};

/// Team - owns matches it creates and requests to fill others' open slots
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>, created_by: Option<UserId>) -> Self {
        Self {
            id: TeamId::new(),
            name: name.into(),
            created_by,
            created_at: Utc::now(),
        }
    }

    pub async fn find_by_id<'e>(id: TeamId, executor: impl PgExecutor<'e>) -> AppResult<Option<Self>> {
        let team = sqlx::query_as::<_, Self>("SELECT * FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(team)
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Self> {
        let team = sqlx::query_as::<_, Self>(
            "INSERT INTO teams (id, name, created_by, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(self.created_by)
        .bind(self.created_at)
        .fetch_one(executor)
        .await?;
        Ok(team)
    }
}
