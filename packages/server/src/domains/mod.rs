// Business domains
pub mod availability;
pub mod matches;
pub mod notifications;
pub mod teams;
