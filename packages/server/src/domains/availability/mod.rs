//! Availability domain - per-player attendance answers and reminders

pub mod activities;
pub mod models;

pub use activities::{ReminderReport, ReminderWindow};
pub use models::{AvailabilityStatus, MatchAvailability};
