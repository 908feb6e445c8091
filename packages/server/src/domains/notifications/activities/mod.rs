//! Notification activities - fan-out of match events and the in-app feed

mod deliver;
mod feed;
mod publish;

pub use deliver::{notify_users, DeliveryReport};
pub use feed::{list_notifications, mark_notification_read};
pub use publish::publish_match_event;
pub(crate) use publish::team_name;
