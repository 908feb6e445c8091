use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{AppResult, TeamId, UserId};

/// Role inside a team. Captains and co-captains run the match workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Captain,
    CoCaptain,
    Player,
}

impl TeamRole {
    pub fn is_captain(&self) -> bool {
        matches!(self, TeamRole::Captain | TeamRole::CoCaptain)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Inactive,
}

/// A user's membership in a team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: TeamRole,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl TeamMember {
    pub fn active(team_id: TeamId, user_id: UserId, role: TeamRole) -> Self {
        Self {
            team_id,
            user_id,
            role,
            status: MembershipStatus::Active,
            joined_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    pub async fn find<'e>(
        team_id: TeamId,
        user_id: UserId,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Option<Self>> {
        let member = sqlx::query_as::<_, Self>(
            "SELECT * FROM team_members WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(member)
    }

    /// Active members in join order
    pub async fn find_active_for_team<'e>(
        team_id: TeamId,
        executor: impl PgExecutor<'e>,
    ) -> AppResult<Vec<Self>> {
        let members = sqlx::query_as::<_, Self>(
            "SELECT * FROM team_members
             WHERE team_id = $1 AND status = 'active'
             ORDER BY joined_at, user_id",
        )
        .bind(team_id)
        .fetch_all(executor)
        .await?;
        Ok(members)
    }

    /// Insert or replace role/status for an existing membership
    pub async fn upsert<'e>(&self, executor: impl PgExecutor<'e>) -> AppResult<Self> {
        let member = sqlx::query_as::<_, Self>(
            "INSERT INTO team_members (team_id, user_id, role, status, joined_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (team_id, user_id)
             DO UPDATE SET role = EXCLUDED.role, status = EXCLUDED.status
             RETURNING *",
        )
        .bind(self.team_id)
        .bind(self.user_id)
        .bind(self.role)
        .bind(self.status)
        .bind(self.joined_at)
        .fetch_one(executor)
        .await?;
        Ok(member)
    }
}
