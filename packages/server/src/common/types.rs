// Common types used across multiple domains and layers
//
// Ambient values (who is acting, what time it is) are passed explicitly so
// time-dependent rules stay deterministic under test.

use chrono::{DateTime, Utc};

use super::UserId;

/// Who performs an operation, and the instant it is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub actor_id: UserId,
    pub now: DateTime<Utc>,
}

impl ActorContext {
    pub fn new(actor_id: UserId, now: DateTime<Utc>) -> Self {
        Self { actor_id, now }
    }

    /// Context for a user acting at the current wall-clock time.
    pub fn at_now(actor_id: UserId) -> Self {
        Self::new(actor_id, Utc::now())
    }

    /// No authenticated user behind this context
    pub fn is_system(&self) -> bool {
        self.actor_id.is_nil()
    }
}
