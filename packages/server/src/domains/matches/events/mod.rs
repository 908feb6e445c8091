use serde::Serialize;

use crate::common::TeamId;
use crate::domains::matches::models::{Match, MatchRequest};

/// Match domain events - FACT EVENTS ONLY
///
/// Returned by activities after a successful commit. Notification fan-out
/// reads these; errors go in `Result::Err`, never in events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    MatchCreated { fixture: Match },

    RequestCreated { fixture: Match, request: MatchRequest },

    /// `auto_rejected` are the other pending requests closed by the accept
    RequestAccepted {
        fixture: Match,
        request: MatchRequest,
        auto_rejected: Vec<MatchRequest>,
    },

    /// `fixture.status` is `available` again when this was the last pending request
    RequestRejected { fixture: Match, request: MatchRequest },

    RequestWithdrawn { fixture: Match, request: MatchRequest },

    MatchStarted { fixture: Match },

    MatchCompleted { fixture: Match },

    /// A completed match's score was corrected
    ScoreCorrected { fixture: Match },

    MatchCancelled {
        fixture: Match,
        /// The team whose captain cancelled
        cancelled_by_team: TeamId,
        auto_rejected: Vec<MatchRequest>,
    },
}

impl MatchEvent {
    /// The match as committed
    pub fn fixture(&self) -> &Match {
        match self {
            MatchEvent::MatchCreated { fixture }
            | MatchEvent::RequestCreated { fixture, .. }
            | MatchEvent::RequestAccepted { fixture, .. }
            | MatchEvent::RequestRejected { fixture, .. }
            | MatchEvent::RequestWithdrawn { fixture, .. }
            | MatchEvent::MatchStarted { fixture }
            | MatchEvent::MatchCompleted { fixture }
            | MatchEvent::ScoreCorrected { fixture }
            | MatchEvent::MatchCancelled { fixture, .. } => fixture,
        }
    }

    /// The request this event is about, if any
    pub fn request(&self) -> Option<&MatchRequest> {
        match self {
            MatchEvent::RequestCreated { request, .. }
            | MatchEvent::RequestAccepted { request, .. }
            | MatchEvent::RequestRejected { request, .. }
            | MatchEvent::RequestWithdrawn { request, .. } => Some(request),
            _ => None,
        }
    }

    pub fn into_fixture(self) -> Match {
        match self {
            MatchEvent::MatchCreated { fixture }
            | MatchEvent::RequestCreated { fixture, .. }
            | MatchEvent::RequestAccepted { fixture, .. }
            | MatchEvent::RequestRejected { fixture, .. }
            | MatchEvent::RequestWithdrawn { fixture, .. }
            | MatchEvent::MatchStarted { fixture }
            | MatchEvent::MatchCompleted { fixture }
            | MatchEvent::ScoreCorrected { fixture }
            | MatchEvent::MatchCancelled { fixture, .. } => fixture,
        }
    }
}
