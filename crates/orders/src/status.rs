use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use itrax_core::DomainError;

/// Delivery stage of a procurement order.
///
/// There is no forward-only rule: any stage may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Ordered,
    Processing,
    Shipped,
    InTransit,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Ordered,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::InTransit,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Ordered => "Ordered",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::InTransit => "InTransit",
            OrderStatus::OutForDelivery => "OutForDelivery",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Exact, case-sensitive match against the six wire names.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage reached by an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub stage: OrderStatus,
    pub date: DateTime<Utc>,
}

/// Validate the body of a status-only change request.
pub fn parse_status_change(raw: Option<&str>) -> Result<OrderStatus, DomainError> {
    raw.and_then(OrderStatus::parse)
        .ok_or_else(|| DomainError::validation("Invalid status"))
}
