use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{AppResult, AvailabilityId, MatchId, TeamId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "availability_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Pending,
    Available,
    Maybe,
    Unavailable,
}

/// One player's answer for one match, per team they play it for.
///
/// Unique per (match_id, user_id, team_id). `reminded_at` is written at most
/// once and only while the answer is still pending.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchAvailability {
    pub id: AvailabilityId,
    pub match_id: MatchId,
    pub user_id: UserId,
    pub team_id: TeamId,
    pub status: AvailabilityStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub reminded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchAvailability {
    pub fn pending(match_id: MatchId, user_id: UserId, team_id: TeamId, now: DateTime<Utc>) -> Self {
        Self {
            id: AvailabilityId::new(),
            match_id,
            user_id,
            team_id,
            status: AvailabilityStatus::Pending,
            confirmed_at: None,
            reminded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Still waiting for an answer and never reminded
    pub fn needs_reminder(&self) -> bool {
        self.status == AvailabilityStatus::Pending && self.reminded_at.is_none()
    }

    /// Copy with a new answer. `confirmed_at` is stamped on the first move out of pending.
    pub fn with_status(&self, status: AvailabilityStatus, now: DateTime<Utc>) -> Self {
        let confirmed_at = if self.status == AvailabilityStatus::Pending
            && status != AvailabilityStatus::Pending
        {
            Some(now)
        } else {
            self.confirmed_at
        };

        Self {
            status,
            confirmed_at,
            updated_at: now,
            ..self.clone()
        }
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    pub async fn find<'e>(
        match_id: MatchId,
        user_id: UserId,
        team_id: TeamId,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>(
            "SELECT * FROM match_availabilities
             WHERE match_id = $1 AND user_id = $2 AND team_id = $3",
        )
        .bind(match_id)
        .bind(user_id)
        .bind(team_id)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    pub async fn find_for_match<'e>(
        match_id: MatchId,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Vec<Self>> {
        let records = sqlx::query_as::<_, Self>(
            "SELECT * FROM match_availabilities
             WHERE match_id = $1
             ORDER BY team_id, created_at, user_id",
        )
        .bind(match_id)
        .fetch_all(executor)
        .await?;
        Ok(records)
    }

    /// Insert unless a row for the same (match, user, team) exists.
    ///
    /// Returns the inserted row, or `None` when the insert was a no-op.
    pub async fn insert_if_absent<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Option<Self>> {
        let inserted = sqlx::query_as::<_, Self>(
            "INSERT INTO match_availabilities (
                id, match_id, user_id, team_id, status, confirmed_at, reminded_at, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (match_id, user_id, team_id) DO NOTHING
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.match_id)
        .bind(self.user_id)
        .bind(self.team_id)
        .bind(self.status)
        .bind(self.confirmed_at)
        .bind(self.reminded_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_optional(executor)
        .await?;
        Ok(inserted)
    }

    pub async fn update_status<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Option<Self>> {
        let updated = sqlx::query_as::<_, Self>(
            "UPDATE match_availabilities
             SET status = $2, confirmed_at = $3, updated_at = $4
             WHERE id = $1
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.status)
        .bind(self.confirmed_at)
        .bind(self.updated_at)
        .fetch_optional(executor)
        .await?;
        Ok(updated)
    }

    /// Stamp `reminded_at` if the row is still pending and unreminded.
    ///
    /// Returns `false` when the guard did not hold (already reminded or answered).
    pub async fn mark_reminded<'e>(
        id: AvailabilityId,
        now: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE match_availabilities
             SET reminded_at = $2, updated_at = $2
             WHERE id = $1 AND status = 'pending' AND reminded_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> MatchAvailability {
        MatchAvailability::pending(MatchId::new(), UserId::new(), TeamId::new(), Utc::now())
    }

    #[test]
    fn first_answer_stamps_confirmed_at() {
        let now = Utc::now();
        let answered = record().with_status(AvailabilityStatus::Maybe, now);
        assert_eq!(answered.status, AvailabilityStatus::Maybe);
        assert_eq!(answered.confirmed_at, Some(now));
    }

    #[test]
    fn changing_an_answer_keeps_original_confirmation_time() {
        let first = Utc::now();
        let later = first + Duration::hours(2);
        let answered = record()
            .with_status(AvailabilityStatus::Available, first)
            .with_status(AvailabilityStatus::Unavailable, later);
        assert_eq!(answered.confirmed_at, Some(first));
        assert_eq!(answered.updated_at, later);
    }

    #[test]
    fn only_unanswered_unreminded_rows_need_reminders() {
        let fresh = record();
        assert!(fresh.needs_reminder());

        let reminded = MatchAvailability {
            reminded_at: Some(Utc::now()),
            ..fresh.clone()
        };
        assert!(!reminded.needs_reminder());

        let answered = fresh.with_status(AvailabilityStatus::Available, Utc::now());
        assert!(!answered.needs_reminder());
    }
}
