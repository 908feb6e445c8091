//! Typed ID definitions for every persisted entity.

pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for registered users (players, captains).
pub struct User;

/// Marker type for teams.
pub struct Team;

/// Marker type for scheduled fixtures.
pub struct Match;

/// Marker type for requests to fill a match's away slot.
pub struct MatchRequest;

/// Marker type for per-player availability records.
pub struct MatchAvailability;

/// Marker type for in-app notification feed entries.
pub struct Notification;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type TeamId = Id<Team>;
pub type MatchId = Id<Match>;
pub type MatchRequestId = Id<MatchRequest>;
pub type AvailabilityId = Id<MatchAvailability>;
pub type NotificationId = Id<Notification>;
