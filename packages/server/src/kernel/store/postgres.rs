use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{
    AvailabilityRepository, MatchChangeset, MatchRepository, NotificationFeed, TeamDirectory,
};
use crate::common::{
    AppError, AppResult, AvailabilityId, MatchId, MatchRequestId, NotificationId, TeamId, UserId,
};
use crate::domains::availability::models::MatchAvailability;
use crate::domains::matches::models::{Match, MatchRequest, MatchStatus};
use crate::domains::notifications::models::Notification;
use crate::domains::teams::models::{Team, TeamMember, User};

/// Postgres-backed store. Model types own their SQL; this wires them to a pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Unique-index violations become conflicts so callers can re-read and retry.
fn unique_violation_as_conflict(err: AppError) -> AppError {
    match err {
        AppError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            AppError::conflict(db.message().to_string())
        }
        other => other,
    }
}

#[async_trait]
impl TeamDirectory for PostgresStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        User::find_by_id(id, &self.pool).await
    }

    async fn find_team(&self, id: TeamId) -> AppResult<Option<Team>> {
        Team::find_by_id(id, &self.pool).await
    }

    async fn find_membership(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>> {
        TeamMember::find(team_id, user_id, &self.pool).await
    }

    async fn active_members(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>> {
        TeamMember::find_active_for_team(team_id, &self.pool).await
    }

    async fn insert_user(&self, user: &User) -> AppResult<User> {
        user.insert(&self.pool)
            .await
            .map_err(unique_violation_as_conflict)
    }

    async fn insert_team(&self, team: &Team) -> AppResult<Team> {
        team.insert(&self.pool).await
    }

    async fn upsert_member(&self, member: &TeamMember) -> AppResult<TeamMember> {
        member.upsert(&self.pool).await
    }
}

#[async_trait]
impl MatchRepository for PostgresStore {
    async fn insert_match(&self, fixture: &Match) -> AppResult<Match> {
        fixture.insert(&self.pool).await
    }

    async fn find_match(&self, id: MatchId) -> AppResult<Option<Match>> {
        Match::find_by_id(id, &self.pool).await
    }

    async fn matches_for_team(&self, team_id: TeamId) -> AppResult<Vec<Match>> {
        Match::find_for_team(team_id, &self.pool).await
    }

    async fn matches_scheduled_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[MatchStatus],
    ) -> AppResult<Vec<Match>> {
        Match::find_scheduled_between(from, to, statuses, &self.pool).await
    }

    async fn find_request(&self, id: MatchRequestId) -> AppResult<Option<MatchRequest>> {
        MatchRequest::find_by_id(id, &self.pool).await
    }

    async fn requests_for_match(&self, match_id: MatchId) -> AppResult<Vec<MatchRequest>> {
        MatchRequest::find_for_match(match_id, &self.pool).await
    }

    async fn commit(&self, changeset: MatchChangeset) -> AppResult<()> {
        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        if let Some(update) = &changeset.match_update {
            let written = update
                .updated
                .compare_and_update(update.expected_status, update.expected_version, &mut *tx)
                .await?;
            if written.is_none() {
                return Err(AppError::conflict(format!(
                    "match {} changed concurrently",
                    update.updated.id
                )));
            }
        }

        for update in &changeset.request_updates {
            let written = update
                .updated
                .compare_and_update(update.expected_status, &mut *tx)
                .await
                .map_err(unique_violation_as_conflict)?;
            if written.is_none() {
                return Err(AppError::conflict(format!(
                    "request {} is no longer {}",
                    update.updated.id, update.expected_status
                )));
            }
        }

        for request in &changeset.new_requests {
            request
                .insert(&mut *tx)
                .await
                .map_err(unique_violation_as_conflict)?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AvailabilityRepository for PostgresStore {
    async fn ensure_availability(
        &self,
        match_id: MatchId,
        user_id: UserId,
        team_id: TeamId,
        now: DateTime<Utc>,
    ) -> AppResult<(MatchAvailability, bool)> {
        let candidate = MatchAvailability::pending(match_id, user_id, team_id, now);
        if let Some(inserted) = candidate.insert_if_absent(&self.pool).await? {
            return Ok((inserted, true));
        }

        let existing = MatchAvailability::find(match_id, user_id, team_id, &self.pool)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "availability for match {} user {} vanished after insert conflict",
                    match_id,
                    user_id
                ))
            })?;
        Ok((existing, false))
    }

    async fn find_availability(
        &self,
        match_id: MatchId,
        user_id: UserId,
        team_id: TeamId,
    ) -> AppResult<Option<MatchAvailability>> {
        MatchAvailability::find(match_id, user_id, team_id, &self.pool).await
    }

    async fn availability_for_match(&self, match_id: MatchId) -> AppResult<Vec<MatchAvailability>> {
        MatchAvailability::find_for_match(match_id, &self.pool).await
    }

    async fn save_availability_status(
        &self,
        record: &MatchAvailability,
    ) -> AppResult<MatchAvailability> {
        record
            .update_status(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("MatchAvailability", record.id))
    }

    async fn mark_reminded(&self, id: AvailabilityId, now: DateTime<Utc>) -> AppResult<bool> {
        MatchAvailability::mark_reminded(id, now, &self.pool).await
    }
}

#[async_trait]
impl NotificationFeed for PostgresStore {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<Notification> {
        notification.insert(&self.pool).await
    }

    async fn notifications_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        Notification::find_for_user(user_id, unread_only, limit, &self.pool).await
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        Notification::mark_read(id, user_id, now, &self.pool).await
    }
}
