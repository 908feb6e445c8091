pub mod match_availability;

pub use match_availability::{AvailabilityStatus, MatchAvailability};
