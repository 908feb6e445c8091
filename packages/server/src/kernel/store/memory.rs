//! In-memory store for tests and local development.
//!
//! Every trait method takes the lock once and does not await while holding
//! it, so `commit` is atomic with respect to other callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    AvailabilityRepository, MatchChangeset, MatchRepository, NotificationFeed, TeamDirectory,
};
use crate::common::{
    AppError, AppResult, AvailabilityId, MatchId, MatchRequestId, NotificationId, TeamId, UserId,
};
use crate::domains::availability::models::MatchAvailability;
use crate::domains::matches::models::{Match, MatchRequest, MatchRequestStatus, MatchStatus};
use crate::domains::notifications::models::Notification;
use crate::domains::teams::models::{Team, TeamMember, User};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    teams: HashMap<TeamId, Team>,
    members: Vec<TeamMember>,
    matches: HashMap<MatchId, Match>,
    requests: HashMap<MatchRequestId, MatchRequest>,
    availability: HashMap<AvailabilityId, MatchAvailability>,
    notifications: Vec<Notification>,
}

/// In-memory implementation of [`super::Store`].
///
/// Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        // A poisoned lock only means a test panicked mid-write; the data is still usable.
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn notification_count(&self) -> usize {
        self.read().notifications.len()
    }

    pub fn availability_count(&self) -> usize {
        self.read().availability.len()
    }
}

#[async_trait]
impl TeamDirectory for MemoryStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_team(&self, id: TeamId) -> AppResult<Option<Team>> {
        Ok(self.read().teams.get(&id).cloned())
    }

    async fn find_membership(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> AppResult<Option<TeamMember>> {
        Ok(self
            .read()
            .members
            .iter()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn active_members(&self, team_id: TeamId) -> AppResult<Vec<TeamMember>> {
        let mut members: Vec<TeamMember> = self
            .read()
            .members
            .iter()
            .filter(|m| m.team_id == team_id && m.is_active())
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.joined_at, m.user_id));
        Ok(members)
    }

    async fn insert_user(&self, user: &User) -> AppResult<User> {
        let mut tables = self.write();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict(format!("email already registered: {}", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn insert_team(&self, team: &Team) -> AppResult<Team> {
        self.write().teams.insert(team.id, team.clone());
        Ok(team.clone())
    }

    async fn upsert_member(&self, member: &TeamMember) -> AppResult<TeamMember> {
        let mut tables = self.write();
        match tables
            .members
            .iter_mut()
            .find(|m| m.team_id == member.team_id && m.user_id == member.user_id)
        {
            Some(existing) => {
                existing.role = member.role;
                existing.status = member.status;
                Ok(existing.clone())
            }
            None => {
                tables.members.push(member.clone());
                Ok(member.clone())
            }
        }
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn insert_match(&self, fixture: &Match) -> AppResult<Match> {
        let mut stored = fixture.clone();
        stored.lock_version = 0;
        self.write().matches.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_match(&self, id: MatchId) -> AppResult<Option<Match>> {
        Ok(self.read().matches.get(&id).cloned())
    }

    async fn matches_for_team(&self, team_id: TeamId) -> AppResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .read()
            .matches
            .values()
            .filter(|m| m.is_participant(team_id))
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.scheduled_at, m.id));
        Ok(matches)
    }

    async fn matches_scheduled_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[MatchStatus],
    ) -> AppResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .read()
            .matches
            .values()
            .filter(|m| m.scheduled_at >= from && m.scheduled_at <= to)
            .filter(|m| statuses.contains(&m.status))
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.scheduled_at, m.id));
        Ok(matches)
    }

    async fn find_request(&self, id: MatchRequestId) -> AppResult<Option<MatchRequest>> {
        Ok(self.read().requests.get(&id).cloned())
    }

    async fn requests_for_match(&self, match_id: MatchId) -> AppResult<Vec<MatchRequest>> {
        let mut requests: Vec<MatchRequest> = self
            .read()
            .requests
            .values()
            .filter(|r| r.match_id == match_id)
            .cloned()
            .collect();
        requests.sort_by_key(|r| (r.created_at, r.id));
        Ok(requests)
    }

    async fn commit(&self, changeset: MatchChangeset) -> AppResult<()> {
        let mut tables = self.write();

        // Check every guard before touching anything.
        if let Some(update) = &changeset.match_update {
            let current = tables
                .matches
                .get(&update.updated.id)
                .ok_or_else(|| AppError::not_found("Match", update.updated.id))?;
            if current.status != update.expected_status
                || current.lock_version != update.expected_version
            {
                return Err(AppError::conflict(format!(
                    "match {} changed concurrently",
                    current.id
                )));
            }
        }

        for update in &changeset.request_updates {
            let current = tables
                .requests
                .get(&update.updated.id)
                .ok_or_else(|| AppError::not_found("MatchRequest", update.updated.id))?;
            if current.status != update.expected_status {
                return Err(AppError::conflict(format!(
                    "request {} is already {}",
                    current.id, current.status
                )));
            }
        }

        for request in &changeset.new_requests {
            let duplicate = tables.requests.values().any(|r| {
                r.match_id == request.match_id
                    && r.requesting_team_id == request.requesting_team_id
                    && r.is_pending()
            });
            if duplicate {
                return Err(AppError::conflict(format!(
                    "team {} already has a pending request for match {}",
                    request.requesting_team_id, request.match_id
                )));
            }
        }

        // Unique accepted request per match, evaluated against the post-commit state.
        for update in &changeset.request_updates {
            if update.updated.status != MatchRequestStatus::Accepted {
                continue;
            }
            let other_accepted = tables.requests.values().any(|r| {
                r.match_id == update.updated.match_id
                    && r.id != update.updated.id
                    && r.status == MatchRequestStatus::Accepted
            });
            if other_accepted {
                return Err(AppError::conflict(format!(
                    "match {} already has an accepted request",
                    update.updated.match_id
                )));
            }
        }

        if let Some(update) = changeset.match_update {
            let mut stored = update.updated;
            stored.lock_version = update.expected_version + 1;
            tables.matches.insert(stored.id, stored);
        }
        for request in changeset.new_requests {
            tables.requests.insert(request.id, request);
        }
        for update in changeset.request_updates {
            tables.requests.insert(update.updated.id, update.updated);
        }

        Ok(())
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn ensure_availability(
        &self,
        match_id: MatchId,
        user_id: UserId,
        team_id: TeamId,
        now: DateTime<Utc>,
    ) -> AppResult<(MatchAvailability, bool)> {
        let mut tables = self.write();
        if let Some(existing) = tables
            .availability
            .values()
            .find(|a| a.match_id == match_id && a.user_id == user_id && a.team_id == team_id)
        {
            return Ok((existing.clone(), false));
        }

        let record = MatchAvailability::pending(match_id, user_id, team_id, now);
        tables.availability.insert(record.id, record.clone());
        Ok((record, true))
    }

    async fn find_availability(
        &self,
        match_id: MatchId,
        user_id: UserId,
        team_id: TeamId,
    ) -> AppResult<Option<MatchAvailability>> {
        Ok(self
            .read()
            .availability
            .values()
            .find(|a| a.match_id == match_id && a.user_id == user_id && a.team_id == team_id)
            .cloned())
    }

    async fn availability_for_match(&self, match_id: MatchId) -> AppResult<Vec<MatchAvailability>> {
        let mut records: Vec<MatchAvailability> = self
            .read()
            .availability
            .values()
            .filter(|a| a.match_id == match_id)
            .cloned()
            .collect();
        records.sort_by_key(|a| (a.team_id, a.created_at, a.user_id));
        Ok(records)
    }

    async fn save_availability_status(
        &self,
        record: &MatchAvailability,
    ) -> AppResult<MatchAvailability> {
        let mut tables = self.write();
        let stored = tables
            .availability
            .get_mut(&record.id)
            .ok_or_else(|| AppError::not_found("MatchAvailability", record.id))?;
        stored.status = record.status;
        stored.confirmed_at = record.confirmed_at;
        stored.updated_at = record.updated_at;
        Ok(stored.clone())
    }

    async fn mark_reminded(&self, id: AvailabilityId, now: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.write();
        match tables.availability.get_mut(&id) {
            Some(record) if record.needs_reminder() => {
                record.reminded_at = Some(now);
                record.updated_at = now;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(AppError::not_found("MatchAvailability", id)),
        }
    }
}

#[async_trait]
impl NotificationFeed for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<Notification> {
        self.write().notifications.push(notification.clone());
        Ok(notification.clone())
    }

    async fn notifications_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .read()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read()))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        notifications.truncate(limit.max(0) as usize);
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        let mut tables = self.write();
        Ok(tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.read_at.get_or_insert(now);
                n.clone()
            }))
    }
}
