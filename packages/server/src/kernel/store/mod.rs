//! Persistence traits for the match workflow.
//!
//! The store is split into focused traits:
//! - `TeamDirectory`: users, teams and memberships (read-mostly)
//! - `MatchRepository`: matches and requests, written through `MatchChangeset`
//! - `AvailabilityRepository`: per-player availability rows
//! - `NotificationFeed`: the in-app notification feed
//! - `Store`: composite of all four
//!
//! Workflow writes go through [`MatchRepository::commit`], which applies a
//! changeset atomically and fails with a conflict if any compare-and-set
//! guard no longer holds.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{
    AppResult, AvailabilityId, MatchId, MatchRequestId, NotificationId, TeamId, UserId,
};
use crate::domains::availability::models::MatchAvailability;
use crate::domains::matches::models::{Match, MatchRequest, MatchRequestStatus, MatchStatus};
use crate::domains::notifications::models::Notification;
use crate::domains::teams::models::{Team, TeamMember, User};

/// Users, teams and memberships.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    async fn find_team(&self, id: TeamId) -> AppResult<Option<Team>>;

    async fn find_membership(&self, team_id: TeamId, user_id: UserId)
        -> AppResult<Option<TeamMember>>;

    /// Active members of a team, in join order.
    async fn active_members(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>>;

    /// Active captains and co-captains of a team.
    async fn captains(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>> {
        Ok(self
            .active_members(team_id)
            .await?
            .into_iter()
            .filter(|m| m.role.is_captain())
            .collect())
    }

    async fn insert_user(&self, user: &User) -> AppResult<User>;

    async fn insert_team(&self, team: &Team) -> AppResult<Team>;

    async fn upsert_member(&self, member: &TeamMember) -> AppResult<TeamMember>;
}

/// A match row to write, guarded by the status and version it was read at.
#[derive(Debug, Clone)]
pub struct MatchUpdate {
    pub updated: Match,
    pub expected_status: MatchStatus,
    pub expected_version: i32,
}

impl MatchUpdate {
    /// Guard `updated` with the state of `original`.
    pub fn from_original(original: &Match, updated: Match) -> Self {
        Self {
            updated,
            expected_status: original.status,
            expected_version: original.lock_version,
        }
    }
}

/// A request row to write, guarded by the status it was read at.
#[derive(Debug, Clone)]
pub struct RequestUpdate {
    pub updated: MatchRequest,
    pub expected_status: MatchRequestStatus,
}

/// Everything one workflow step writes. Applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct MatchChangeset {
    pub match_update: Option<MatchUpdate>,
    pub new_requests: Vec<MatchRequest>,
    pub request_updates: Vec<RequestUpdate>,
}

impl MatchChangeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_match(mut self, update: MatchUpdate) -> Self {
        self.match_update = Some(update);
        self
    }

    pub fn insert_request(mut self, request: MatchRequest) -> Self {
        self.new_requests.push(request);
        self
    }

    pub fn update_request(mut self, updated: MatchRequest, expected_status: MatchRequestStatus) -> Self {
        self.request_updates.push(RequestUpdate {
            updated,
            expected_status,
        });
        self
    }
}

/// Matches and match requests.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn insert_match(&self, fixture: &Match) -> AppResult<Match>;

    async fn find_match(&self, id: MatchId) -> AppResult<Option<Match>>;

    async fn matches_for_team(&self, team_id: TeamId) -> AppResult<Vec<Match>>;

    /// Matches kicking off inside `[from, to]` whose status is in `statuses`.
    async fn matches_scheduled_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[MatchStatus],
    ) -> AppResult<Vec<Match>>;

    async fn find_request(&self, id: MatchRequestId) -> AppResult<Option<MatchRequest>>;

    async fn requests_for_match(&self, match_id: MatchId) -> AppResult<Vec<MatchRequest>>;

    /// Apply a changeset in one transaction.
    ///
    /// Fails with `AppError::Conflict` (and writes nothing) when the match or
    /// any request no longer has its expected status, or when an insert
    /// violates a uniqueness rule.
    async fn commit(&self, changeset: MatchChangeset) -> AppResult<()>;
}

/// Per-player availability rows.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Look up the row for (match, user, team), creating a pending one if absent.
    ///
    /// The boolean is `true` when this call created the row.
    async fn ensure_availability(
        &self,
        match_id: MatchId,
        user_id: UserId,
        team_id: TeamId,
        now: DateTime<Utc>,
    ) -> AppResult<(MatchAvailability, bool)>;

    async fn find_availability(
        &self,
        match_id: MatchId,
        user_id: UserId,
        team_id: TeamId,
    ) -> AppResult<Option<MatchAvailability>>;

    async fn availability_for_match(&self, match_id: MatchId) -> AppResult<Vec<MatchAvailability>>;

    /// Persist `status`, `confirmed_at` and `updated_at` of `record`.
    async fn save_availability_status(&self, record: &MatchAvailability) -> AppResult<MatchAvailability>;

    /// Set `reminded_at` if the row is still pending and unreminded.
    async fn mark_reminded(&self, id: AvailabilityId, now: DateTime<Utc>) -> AppResult<bool>;
}

/// In-app notification feed.
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<Notification>;

    async fn notifications_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Notification>>;
}

/// Composite store used by `ServerDeps`.
pub trait Store: TeamDirectory + MatchRepository + AvailabilityRepository + NotificationFeed {}

impl<T> Store for T where T: TeamDirectory + MatchRepository + AvailabilityRepository + NotificationFeed {}
