pub mod notification;

pub use notification::{Notification, NotificationKind, NotificationPayload};
