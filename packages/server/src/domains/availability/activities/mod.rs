//! Availability activities - records, player responses and the reminder run

mod records;
mod reminders;
mod respond;

pub use records::{ensure_exists, mark_reminded, update_status};
pub use reminders::{run_availability_reminders, ReminderReport, ReminderWindow};
pub use respond::{match_availability_summary, respond_to_match, AvailabilitySummary, TeamAvailability};
