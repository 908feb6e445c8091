//! Availability reminder run
//!
//! ```text
//! matches kicking off in [now + lead - tolerance, now + lead + tolerance]
//!     ├─► each side (home, away if set)
//!     │       └─► each active member → ensure availability record
//!     └─► each user with a pending, never-reminded record
//!             └─► one dispatch → mark all their pending records reminded
//! ```
//!
//! `reminded_at` is the only gate, so back-to-back runs send each reminder
//! once. A failed send leaves the record unmarked and is retried next run.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::records::{ensure_exists, mark_reminded};
use crate::common::{AppError, AppResult, TeamId, UserId};
use crate::domains::availability::models::MatchAvailability;
use crate::domains::matches::models::{Match, MatchStatus};
use crate::domains::notifications::activities::team_name;
use crate::domains::notifications::models::NotificationPayload;
use crate::domains::notifications::templates;
use crate::kernel::ServerDeps;

/// Statuses whose matches still need players to confirm
const REMINDABLE: [MatchStatus; 2] = [MatchStatus::Confirmed, MatchStatus::Available];

/// How far ahead of kickoff reminders go out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub lead: Duration,
    pub tolerance: Duration,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self {
            lead: Duration::hours(48),
            tolerance: Duration::minutes(15),
        }
    }
}

impl ReminderWindow {
    pub fn new(lead: Duration, tolerance: Duration) -> Self {
        Self { lead, tolerance }
    }

    /// Inclusive kickoff bounds for a run at `now`
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let center = now + self.lead;
        (center - self.tolerance, center + self.tolerance)
    }

    pub fn contains(&self, now: DateTime<Utc>, kickoff: DateTime<Utc>) -> bool {
        let (from, to) = self.bounds(now);
        kickoff >= from && kickoff <= to
    }
}

/// What one reminder run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub matches_scanned: usize,
    pub records_created: usize,
    pub reminders_sent: usize,
    pub failures: usize,
    /// The run did nothing because the previous one was still going
    pub skipped: bool,
}

impl ReminderReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Remind every unconfirmed participant of matches in the window.
///
/// Only the match query can fail the run. Per-member problems are logged,
/// counted in `failures`, and the run moves on.
pub async fn run_availability_reminders(now: DateTime<Utc>, deps: &ServerDeps) -> AppResult<ReminderReport> {
    let (from, to) = deps.reminder_window.bounds(now);
    let matches = deps
        .store
        .matches_scheduled_between(from, to, &REMINDABLE)
        .await?;

    let mut report = ReminderReport {
        matches_scanned: matches.len(),
        ..Default::default()
    };

    if matches.is_empty() {
        debug!(from = %from, to = %to, "No matches in reminder window");
        return Ok(report);
    }

    for fixture in &matches {
        remind_match(fixture, now, deps, &mut report).await;
    }

    info!(
        matches_scanned = report.matches_scanned,
        records_created = report.records_created,
        reminders_sent = report.reminders_sent,
        failures = report.failures,
        "Availability reminder run finished"
    );
    Ok(report)
}

/// One participant of a match with the records they still owe an answer on.
/// A member of both sides has a record per team but gets a single reminder.
struct Recipient {
    user_id: UserId,
    team_id: TeamId,
    records: Vec<MatchAvailability>,
}

async fn remind_match(fixture: &Match, now: DateTime<Utc>, deps: &ServerDeps, report: &mut ReminderReport) {
    let mut recipients: Vec<Recipient> = Vec::new();
    let mut index: HashMap<UserId, usize> = HashMap::new();

    for team_id in fixture.participating_teams() {
        let members = match deps.store.active_members(team_id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(match_id = %fixture.id, team_id = %team_id, error = %e, "Failed to load team members");
                report.failures += 1;
                continue;
            }
        };

        for member in members {
            let record = match ensure_exists(fixture.id, member.user_id, team_id, now, deps).await {
                Ok((record, created)) => {
                    if created {
                        report.records_created += 1;
                    }
                    record
                }
                Err(e) => {
                    warn!(match_id = %fixture.id, user_id = %member.user_id, error = %e, "Failed to ensure availability record");
                    report.failures += 1;
                    continue;
                }
            };

            if !record.needs_reminder() {
                debug!(match_id = %fixture.id, user_id = %member.user_id, status = ?record.status, "Already reminded or answered");
                continue;
            }

            match index.get(&member.user_id) {
                Some(&i) => recipients[i].records.push(record),
                None => {
                    index.insert(member.user_id, recipients.len());
                    recipients.push(Recipient {
                        user_id: member.user_id,
                        team_id,
                        records: vec![record],
                    });
                }
            }
        }
    }

    let mut payloads: HashMap<TeamId, NotificationPayload> = HashMap::new();
    for recipient in recipients {
        if !payloads.contains_key(&recipient.team_id) {
            let payload = reminder_payload(fixture, recipient.team_id, now, deps).await;
            payloads.insert(recipient.team_id, payload);
        }
        let Some(payload) = payloads.get(&recipient.team_id) else {
            continue;
        };

        if let Err(e) = remind_user(fixture, &recipient, payload, now, deps, report).await {
            warn!(
                match_id = %fixture.id,
                user_id = %recipient.user_id,
                error = %e,
                "Availability reminder failed"
            );
            report.failures += 1;
        }
    }
}

async fn reminder_payload(fixture: &Match, team_id: TeamId, now: DateTime<Utc>, deps: &ServerDeps) -> NotificationPayload {
    let opponent = match fixture.opponent_of(team_id) {
        Some(opponent_id) => team_name(opponent_id, deps).await,
        None => "an opponent to be confirmed".to_string(),
    };
    templates::availability_reminder(fixture, &opponent, &deps.app_base_url, now)
}

async fn remind_user(
    fixture: &Match,
    recipient: &Recipient,
    payload: &NotificationPayload,
    now: DateTime<Utc>,
    deps: &ServerDeps,
    report: &mut ReminderReport,
) -> AppResult<()> {
    let user = deps
        .store
        .find_user(recipient.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", recipient.user_id))?;

    deps.dispatcher.dispatch(&user, payload).await?;

    let mut marked = false;
    for record in &recipient.records {
        marked |= mark_reminded(record, now, deps).await?;
    }
    if marked {
        report.reminders_sent += 1;
    } else {
        debug!(match_id = %fixture.id, user_id = %recipient.user_id, "Records changed while reminding");
    }
    Ok(())
}
