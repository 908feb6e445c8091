//! Notifications domain - in-app feed, push delivery and event fan-out

pub mod activities;
pub mod dispatcher;
pub mod models;
pub mod templates;

pub use dispatcher::ChannelDispatcher;
pub use models::{Notification, NotificationKind, NotificationPayload};
