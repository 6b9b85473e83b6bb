use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use itrax_core::{OrgId, Record, RecordId};

/// How many notifications a user's feed shows.
pub const FEED_SIZE: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderStatus,
    #[default]
    Info,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::OrderStatus => "order_status",
            NotificationKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    /// Recipient.
    pub user_id: RecordId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        org_id: OrgId,
        user_id: RecordId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            org_id,
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            read: false,
            created_at: itrax_core::time::now(),
        }
    }

    /// Tell an order's creator that the order reached a new stage.
    pub fn order_status_changed(org_id: OrgId, user_id: RecordId, order_ref: &str, stage: &str) -> Self {
        Self::new(
            org_id,
            user_id,
            NotificationKind::OrderStatus,
            "Order status updated",
            format!("Order {order_ref} is now {stage}"),
        )
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

impl Record for Notification {
    const COLLECTION: &'static str = "notifications";
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "message"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn org_id(&self) -> OrgId {
        self.org_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "userId" => Some(Cow::Owned(self.user_id.to_string())),
            "title" => Some(Cow::Borrowed(&self.title)),
            "message" => Some(Cow::Borrowed(&self.message)),
            "type" => Some(Cow::Borrowed(self.kind.as_str())),
            _ => None,
        }
    }
}
