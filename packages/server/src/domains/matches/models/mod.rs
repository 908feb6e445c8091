pub mod football_match;
pub mod match_request;

pub use football_match::{Match, MatchStatus, MatchType, MatchVariant, NewMatch};
pub use match_request::{MatchRequest, MatchRequestStatus};
