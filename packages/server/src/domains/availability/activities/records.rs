use chrono::{DateTime, Utc};
use tracing::debug;

use crate::common::{AppResult, MatchId, TeamId, UserId};
use crate::domains::availability::models::{AvailabilityStatus, MatchAvailability};
use crate::kernel::ServerDeps;

/// The record for (match, user, team), created as pending if missing.
///
/// Safe to call repeatedly; a second call returns the existing row.
pub async fn ensure_exists(
    match_id: MatchId,
    user_id: UserId,
    team_id: TeamId,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> AppResult<(MatchAvailability, bool)> {
    let (record, created) = deps
        .store
        .ensure_availability(match_id, user_id, team_id, now)
        .await?;
    if created {
        debug!(match_id = %match_id, user_id = %user_id, team_id = %team_id, "Availability record created");
    }
    Ok((record, created))
}

/// Store a new answer. `confirmed_at` is stamped on the first move out of pending.
pub async fn update_status(
    record: &MatchAvailability,
    status: AvailabilityStatus,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> AppResult<MatchAvailability> {
    deps.store
        .save_availability_status(&record.with_status(status, now))
        .await
}

/// Stamp `reminded_at`. Returns `false` if the record was already reminded or answered.
pub async fn mark_reminded(
    record: &MatchAvailability,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> AppResult<bool> {
    deps.store.mark_reminded(record.id, now).await
}
