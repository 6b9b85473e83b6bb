//! Per-user notifications.

pub mod notification;

pub use notification::{FEED_SIZE, Notification, NotificationKind};
