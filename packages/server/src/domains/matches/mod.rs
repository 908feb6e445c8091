//! Matches domain - fixtures, their lifecycle, and requests to fill the away slot
//!
//! Architecture:
//!   route → activity → machine (pure) → store commit → event → notifications

pub mod activities;
pub mod events;
pub mod machines;
pub mod models;

pub use events::MatchEvent;
pub use models::{Match, MatchRequest, MatchRequestStatus, MatchStatus, MatchType, MatchVariant, NewMatch};
