//! Match state machine - pure transition logic
//!
//! ```text
//! available ──request──► pending ──accept──► confirmed ──start──► in_progress ──complete──► completed
//!     ▲                    │
//!     └──last request closed┘
//!
//! any non-terminal ──cancel──► cancelled
//! ```
//!
//! No I/O here. Activities load the match, ask the machine for the next row,
//! and commit it with a compare-and-set on the status it was read at.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::common::TeamId;
use crate::domains::matches::models::{Match, MatchStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTransition {
    /// A request arrived; the match stays pending if it already was
    RequestReceived,
    /// The home team accepted `away_team_id`'s request
    Accept { away_team_id: TeamId },
    /// The last pending request was rejected or withdrawn
    Reopen,
    Start,
    /// Finish the match; scores already on the row are kept when not given
    Complete {
        home_score: Option<i32>,
        away_score: Option<i32>,
    },
    /// Record the final score. Completes an in-progress match, corrects a completed one
    RecordScore { home_score: i32, away_score: i32 },
    Cancel,
}

impl MatchTransition {
    pub fn name(&self) -> &'static str {
        match self {
            MatchTransition::RequestReceived => "request",
            MatchTransition::Accept { .. } => "accept",
            MatchTransition::Reopen => "reopen",
            MatchTransition::Start => "start",
            MatchTransition::Complete { .. } => "complete",
            MatchTransition::RecordScore { .. } => "record score",
            MatchTransition::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {action} a match that is {from}")]
    NotAllowed {
        from: MatchStatus,
        action: &'static str,
    },

    #[error("match cannot start before its kickoff at {scheduled_at}")]
    BeforeKickoff { scheduled_at: DateTime<Utc> },

    #[error("both home and away scores are required")]
    MissingScore,

    #[error("scores cannot be negative")]
    NegativeScore,

    #[error("a team cannot play against itself")]
    SameTeam,
}

/// Compute the row that results from applying `transition` at `now`.
pub fn apply(
    fixture: &Match,
    transition: MatchTransition,
    now: DateTime<Utc>,
) -> Result<Match, TransitionError> {
    use MatchStatus::*;

    let not_allowed = || TransitionError::NotAllowed {
        from: fixture.status,
        action: transition.name(),
    };

    let mut next = fixture.clone();
    next.updated_at = now;

    match transition {
        MatchTransition::RequestReceived => {
            if !fixture.status.accepts_requests() {
                return Err(not_allowed());
            }
            next.status = Pending;
        }

        MatchTransition::Accept { away_team_id } => {
            if fixture.status != Pending {
                return Err(not_allowed());
            }
            if away_team_id == fixture.home_team_id {
                return Err(TransitionError::SameTeam);
            }
            next.status = Confirmed;
            next.away_team_id = Some(away_team_id);
            next.confirmed_at = Some(now);
        }

        MatchTransition::Reopen => {
            if fixture.status != Pending {
                return Err(not_allowed());
            }
            next.status = Available;
        }

        MatchTransition::Start => {
            if fixture.status != Confirmed {
                return Err(not_allowed());
            }
            if now < fixture.scheduled_at {
                return Err(TransitionError::BeforeKickoff {
                    scheduled_at: fixture.scheduled_at,
                });
            }
            next.status = InProgress;
            next.started_at = Some(now);
        }

        MatchTransition::Complete {
            home_score,
            away_score,
        } => {
            if fixture.status != InProgress {
                return Err(not_allowed());
            }
            let (home, away) = match (
                home_score.or(fixture.home_score),
                away_score.or(fixture.away_score),
            ) {
                (Some(home), Some(away)) => (home, away),
                _ => return Err(TransitionError::MissingScore),
            };
            set_score(&mut next, home, away)?;
            next.status = Completed;
            next.completed_at = Some(now);
        }

        MatchTransition::RecordScore {
            home_score,
            away_score,
        } => match fixture.status {
            InProgress => {
                set_score(&mut next, home_score, away_score)?;
                next.status = Completed;
                next.completed_at = Some(now);
            }
            Completed => set_score(&mut next, home_score, away_score)?,
            _ => return Err(not_allowed()),
        },

        MatchTransition::Cancel => {
            if fixture.status.is_terminal() {
                return Err(not_allowed());
            }
            next.status = Cancelled;
            next.cancelled_at = Some(now);
        }
    }

    Ok(next)
}

fn set_score(next: &mut Match, home: i32, away: i32) -> Result<(), TransitionError> {
    if home < 0 || away < 0 {
        return Err(TransitionError::NegativeScore);
    }
    next.home_score = Some(home);
    next.away_score = Some(away);
    Ok(())
}
