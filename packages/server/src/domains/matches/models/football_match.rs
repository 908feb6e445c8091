use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use typed_builder::TypedBuilder;

use crate::common::{AppResult, MatchId, TeamId, UserId};

/// Match lifecycle status
///
/// `available → pending → confirmed → in_progress → completed`, with
/// `cancelled` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Available,
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Available => write!(f, "available"),
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Confirmed => write!(f, "confirmed"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl MatchStatus {
    /// Completed and cancelled matches never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    /// Open for requests from other teams
    pub fn accepts_requests(&self) -> bool {
        matches!(self, MatchStatus::Available | MatchStatus::Pending)
    }
}

/// Format of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_variant")]
pub enum MatchVariant {
    #[sqlx(rename = "11_a_side")]
    #[serde(rename = "11_a_side")]
    ElevenASide,
    #[sqlx(rename = "7_a_side")]
    #[serde(rename = "7_a_side")]
    SevenASide,
    #[sqlx(rename = "5_a_side")]
    #[serde(rename = "5_a_side")]
    FiveASide,
    #[sqlx(rename = "futsal")]
    #[serde(rename = "futsal")]
    Futsal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Friendly,
    Competitive,
}

/// Match - a fixture created by a home team, optionally paired with an away team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: MatchId,
    pub home_team_id: TeamId,
    /// Null until a request is accepted
    pub away_team_id: Option<TeamId>,
    pub variant: MatchVariant,
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
    pub match_type: MatchType,
    pub status: MatchStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,

    // Transition timestamps
    pub confirmed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,

    /// Optimistic lock counter, bumped by every committed write
    #[serde(skip)]
    pub lock_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a match
#[derive(Debug, Clone, TypedBuilder, Deserialize)]
#[builder(field_defaults(setter(into)))]
pub struct NewMatch {
    pub home_team_id: TeamId,
    pub variant: MatchVariant,
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
    #[builder(default)]
    #[serde(default)]
    pub match_type: MatchType,
    #[builder(default)]
    #[serde(default)]
    pub notes: Option<String>,
}

impl Match {
    /// A fresh open fixture, status `available`
    pub fn open(input: NewMatch, created_by: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: MatchId::new(),
            home_team_id: input.home_team_id,
            away_team_id: None,
            variant: input.variant,
            scheduled_at: input.scheduled_at,
            location: input.location.trim().to_string(),
            match_type: input.match_type,
            status: MatchStatus::Available,
            home_score: None,
            away_score: None,
            notes: input.notes,
            created_by: Some(created_by),
            confirmed_at: None,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            lock_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Home team first, then the away team once one is set
    pub fn participating_teams(&self) -> Vec<TeamId> {
        std::iter::once(self.home_team_id)
            .chain(self.away_team_id)
            .collect()
    }

    pub fn is_participant(&self, team_id: TeamId) -> bool {
        self.home_team_id == team_id || self.away_team_id == Some(team_id)
    }

    /// The other side of the fixture, if there is one
    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if team_id == self.home_team_id {
            self.away_team_id
        } else if self.away_team_id == Some(team_id) {
            Some(self.home_team_id)
        } else {
            None
        }
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    pub async fn find_by_id<'e>(id: MatchId, executor: impl PgExecutor<'e>) -> AppResult<Option<Self>> {
        let found = sqlx::query_as::<_, Self>("SELECT * FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(found)
    }

    /// Home and away fixtures for a team, soonest first
    pub async fn find_for_team<'e>(team_id: TeamId, executor: impl PgExecutor<'e>) -> AppResult<Vec<Self>> {
        let matches = sqlx::query_as::<_, Self>(
            "SELECT * FROM matches
             WHERE home_team_id = $1 OR away_team_id = $1
             ORDER BY scheduled_at ASC",
        )
        .bind(team_id)
        .fetch_all(executor)
        .await?;
        Ok(matches)
    }

    /// Matches kicking off inside `[from, to]` in one of `statuses`
    pub async fn find_scheduled_between<'e>(
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[MatchStatus],
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Vec<Self>> {
        let matches = sqlx::query_as::<_, Self>(
            "SELECT * FROM matches
             WHERE scheduled_at >= $1
               AND scheduled_at <= $2
               AND status = ANY($3)
             ORDER BY scheduled_at ASC, id ASC",
        )
        .bind(from)
        .bind(to)
        .bind(statuses)
        .fetch_all(executor)
        .await?;
        Ok(matches)
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Self> {
        let created = sqlx::query_as::<_, Self>(
            "INSERT INTO matches (
                id, home_team_id, away_team_id, variant, scheduled_at, location,
                match_type, status, notes, created_by, lock_version, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, $12)
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.home_team_id)
        .bind(self.away_team_id)
        .bind(self.variant)
        .bind(self.scheduled_at)
        .bind(&self.location)
        .bind(self.match_type)
        .bind(self.status)
        .bind(&self.notes)
        .bind(self.created_by)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Write this row only if the stored status and lock version still match.
    ///
    /// Returns `None` when another writer got there first.
    pub async fn compare_and_update<'e>(
        &self,
        expected_status: MatchStatus,
        expected_version: i32,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Option<Self>> {
        let updated = sqlx::query_as::<_, Self>(
            "UPDATE matches
             SET away_team_id = $2,
                 status = $3,
                 home_score = $4,
                 away_score = $5,
                 notes = $6,
                 confirmed_at = $7,
                 started_at = $8,
                 completed_at = $9,
                 cancelled_at = $10,
                 updated_at = $11,
                 lock_version = lock_version + 1
             WHERE id = $1
               AND status = $12
               AND lock_version = $13
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.away_team_id)
        .bind(self.status)
        .bind(self.home_score)
        .bind(self.away_score)
        .bind(&self.notes)
        .bind(self.confirmed_at)
        .bind(self.started_at)
        .bind(self.completed_at)
        .bind(self.cancelled_at)
        .bind(self.updated_at)
        .bind(expected_status)
        .bind(expected_version)
        .fetch_optional(executor)
        .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fixture() -> Match {
        let now = Utc::now();
        Match::open(
            NewMatch::builder()
                .home_team_id(TeamId::new())
                .variant(MatchVariant::SevenASide)
                .scheduled_at(now + Duration::days(3))
                .location("  Hackney Marshes, pitch 4 ")
                .build(),
            UserId::new(),
            now,
        )
    }

    #[test]
    fn open_match_has_no_opponent_or_score() {
        let m = fixture();
        assert_eq!(m.status, MatchStatus::Available);
        assert!(m.away_team_id.is_none());
        assert!(m.home_score.is_none() && m.away_score.is_none());
        assert_eq!(m.location, "Hackney Marshes, pitch 4");
        assert_eq!(m.match_type, MatchType::Friendly);
    }

    #[test]
    fn only_open_statuses_accept_requests() {
        assert!(MatchStatus::Available.accepts_requests());
        assert!(MatchStatus::Pending.accepts_requests());
        assert!(!MatchStatus::Confirmed.accepts_requests());
        assert!(!MatchStatus::Cancelled.accepts_requests());
    }

    #[test]
    fn opponent_lookup_works_both_ways() {
        let mut m = fixture();
        let away = TeamId::new();
        assert_eq!(m.opponent_of(m.home_team_id), None);

        m.away_team_id = Some(away);
        assert_eq!(m.opponent_of(m.home_team_id), Some(away));
        assert_eq!(m.opponent_of(away), Some(m.home_team_id));
        assert_eq!(m.opponent_of(TeamId::new()), None);
        assert_eq!(m.participating_teams(), vec![m.home_team_id, away]);
    }

    #[test]
    fn variants_use_pitch_size_names() {
        assert_eq!(
            serde_json::to_string(&MatchVariant::ElevenASide).unwrap(),
            "\"11_a_side\""
        );
        let futsal: MatchVariant = serde_json::from_str("\"futsal\"").unwrap();
        assert_eq!(futsal, MatchVariant::Futsal);
    }
}
