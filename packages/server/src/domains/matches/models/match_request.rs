use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{AppResult, MatchId, MatchRequestId, TeamId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl std::fmt::Display for MatchRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchRequestStatus::Pending => write!(f, "pending"),
            MatchRequestStatus::Accepted => write!(f, "accepted"),
            MatchRequestStatus::Rejected => write!(f, "rejected"),
            MatchRequestStatus::Withdrawn => write!(f, "withdrawn"),
        }
    }
}

/// A second team's proposal to fill a match's away slot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchRequest {
    pub id: MatchRequestId,
    pub match_id: MatchId,
    pub requesting_team_id: TeamId,
    pub requested_by: Option<UserId>,
    pub message: Option<String>,
    pub status: MatchRequestStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl MatchRequest {
    pub fn pending(
        match_id: MatchId,
        requesting_team_id: TeamId,
        requested_by: UserId,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MatchRequestId::new(),
            match_id,
            requesting_team_id,
            requested_by: Some(requested_by),
            message,
            status: MatchRequestStatus::Pending,
            reviewed_at: None,
            reviewed_by: None,
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MatchRequestStatus::Pending
    }

    /// Copy of this request closed with `status` by `reviewer`
    pub fn reviewed(&self, status: MatchRequestStatus, reviewer: UserId, now: DateTime<Utc>) -> Self {
        Self {
            status,
            reviewed_at: Some(now),
            reviewed_by: Some(reviewer),
            ..self.clone()
        }
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    pub async fn find_by_id<'e>(
        id: MatchRequestId,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Option<Self>> {
        let request = sqlx::query_as::<_, Self>("SELECT * FROM match_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    /// All requests for a match, oldest first
    pub async fn find_for_match<'e>(
        match_id: MatchId,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Vec<Self>> {
        let requests = sqlx::query_as::<_, Self>(
            "SELECT * FROM match_requests WHERE match_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(match_id)
        .fetch_all(executor)
        .await?;
        Ok(requests)
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Self> {
        let created = sqlx::query_as::<_, Self>(
            "INSERT INTO match_requests (
                id, match_id, requesting_team_id, requested_by, message, status, created_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.match_id)
        .bind(self.requesting_team_id)
        .bind(self.requested_by)
        .bind(&self.message)
        .bind(self.status)
        .bind(self.created_at)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Write the review outcome only if the stored status is still `expected`
    pub async fn compare_and_update<'e>(
        &self,
        expected: MatchRequestStatus,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Option<Self>> {
        let updated = sqlx::query_as::<_, Self>(
            "UPDATE match_requests
             SET status = $2, reviewed_at = $3, reviewed_by = $4
             WHERE id = $1 AND status = $5
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.status)
        .bind(self.reviewed_at)
        .bind(self.reviewed_by)
        .bind(expected)
        .fetch_optional(executor)
        .await?;
        Ok(updated)
    }
}
