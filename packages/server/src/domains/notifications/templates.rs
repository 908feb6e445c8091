//! Notification payloads for match workflow events.
//!
//! Builders only; who receives them is decided in `activities`.

use chrono::{DateTime, Utc};

use crate::domains::matches::models::{Match, MatchRequest};
use crate::domains::notifications::models::{NotificationKind, NotificationPayload};

const MATCH_MODEL: &str = "match";
const REQUEST_MODEL: &str = "match_request";

fn match_link(base_url: &str, fixture: &Match) -> String {
    format!("{}/matches/{}", base_url, fixture.id)
}

fn kickoff(fixture: &Match) -> String {
    fixture.scheduled_at.format("%a %-d %b, %H:%M UTC").to_string()
}

pub fn request_received(
    fixture: &Match,
    request: &MatchRequest,
    requesting_team: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> NotificationPayload {
    let mut message = format!(
        "{} wants to play your match on {} at {}.",
        requesting_team,
        kickoff(fixture),
        fixture.location
    );
    if let Some(note) = request.message.as_deref().filter(|m| !m.trim().is_empty()) {
        message.push_str(&format!(" \"{}\"", note.trim()));
    }

    NotificationPayload::builder()
        .kind(NotificationKind::MatchRequestReceived)
        .title("New match request")
        .message(message)
        .action_url(Some(match_link(base_url, fixture)))
        .icon(Some("handshake".to_string()))
        .related_model(Some(REQUEST_MODEL.to_string()))
        .related_id(Some(request.id.into_uuid()))
        .created_at(now)
        .build()
}

pub fn request_accepted(
    fixture: &Match,
    request: &MatchRequest,
    home_team: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> NotificationPayload {
    NotificationPayload::builder()
        .kind(NotificationKind::MatchRequestAccepted)
        .title("Match confirmed")
        .message(format!(
            "{} accepted your request. Kickoff {} at {}.",
            home_team,
            kickoff(fixture),
            fixture.location
        ))
        .action_url(Some(match_link(base_url, fixture)))
        .icon(Some("check-circle".to_string()))
        .related_model(Some(REQUEST_MODEL.to_string()))
        .related_id(Some(request.id.into_uuid()))
        .created_at(now)
        .build()
}

pub fn request_rejected(
    fixture: &Match,
    request: &MatchRequest,
    home_team: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> NotificationPayload {
    NotificationPayload::builder()
        .kind(NotificationKind::MatchRequestRejected)
        .title("Match request declined")
        .message(format!(
            "{} declined your request for the match on {}.",
            home_team,
            kickoff(fixture)
        ))
        .action_url(Some(match_link(base_url, fixture)))
        .icon(Some("x-circle".to_string()))
        .related_model(Some(REQUEST_MODEL.to_string()))
        .related_id(Some(request.id.into_uuid()))
        .created_at(now)
        .build()
}

pub fn request_withdrawn(
    fixture: &Match,
    request: &MatchRequest,
    requesting_team: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> NotificationPayload {
    NotificationPayload::builder()
        .kind(NotificationKind::MatchRequestWithdrawn)
        .title("Match request withdrawn")
        .message(format!(
            "{} withdrew their request for your match on {}.",
            requesting_team,
            kickoff(fixture)
        ))
        .action_url(Some(match_link(base_url, fixture)))
        .icon(Some("undo".to_string()))
        .related_model(Some(REQUEST_MODEL.to_string()))
        .related_id(Some(request.id.into_uuid()))
        .created_at(now)
        .build()
}

pub fn match_cancelled(
    fixture: &Match,
    cancelling_team: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> NotificationPayload {
    NotificationPayload::builder()
        .kind(NotificationKind::MatchCancelled)
        .title("Match cancelled")
        .message(format!(
            "{} cancelled the match on {} at {}.",
            cancelling_team,
            kickoff(fixture),
            fixture.location
        ))
        .action_url(Some(match_link(base_url, fixture)))
        .icon(Some("calendar-x".to_string()))
        .related_model(Some(MATCH_MODEL.to_string()))
        .related_id(Some(fixture.id.into_uuid()))
        .created_at(now)
        .build()
}

pub fn availability_reminder(
    fixture: &Match,
    opponent: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> NotificationPayload {
    NotificationPayload::builder()
        .kind(NotificationKind::AvailabilityReminder)
        .title("Are you playing?")
        .message(format!(
            "Match against {} kicks off {} at {}. Let your captain know if you can make it.",
            opponent,
            kickoff(fixture),
            fixture.location
        ))
        .action_url(Some(format!("{}/availability", match_link(base_url, fixture))))
        .icon(Some("calendar-clock".to_string()))
        .related_model(Some(MATCH_MODEL.to_string()))
        .related_id(Some(fixture.id.into_uuid()))
        .created_at(now)
        .build()
}
