//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod scheduled_tasks;
pub mod store;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use scheduled_tasks::{start_scheduler, ReminderScheduler, DEFAULT_REMINDER_CRON};
pub use store::{MemoryStore, PostgresStore, Store};
pub use traits::*;
