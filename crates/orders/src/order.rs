use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use itrax_core::validation::{clean, exceeds, integer, parse_date};
use itrax_core::{DomainError, FieldErrors, OrgId, Record, RecordId};

use crate::status::{OrderStatus, TrackingEntry};

/// Columns of the order CSV export, in order.
pub const EXPORT_FIELDS: [&str; 8] = [
    "orderId",
    "assetName",
    "quantity",
    "supplier",
    "orderDate",
    "estimatedDelivery",
    "currentLocation",
    "status",
];

/// Snapshot of the user who created an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreator {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A procurement order (stored document and API representation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    pub order_id: String,
    pub asset_name: String,
    pub quantity: u32,
    pub supplier: String,
    pub order_date: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    pub current_location: String,
    pub status: OrderStatus,
    pub tracking_history: Vec<TrackingEntry>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<OrderCreator>,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw create/update body.
///
/// `trackingHistory` is deliberately absent: history only grows through
/// status changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub order_id: Option<String>,
    pub asset_name: Option<String>,
    pub quantity: Option<Value>,
    pub supplier: Option<String>,
    pub order_date: Option<String>,
    pub estimated_delivery: Option<String>,
    pub current_location: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// An [`OrderInput`] that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrder {
    pub order_id: Option<String>,
    pub asset_name: String,
    pub quantity: u32,
    pub supplier: String,
    pub order_date: Option<DateTime<Utc>>,
    pub estimated_delivery: DateTime<Utc>,
    pub current_location: String,
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
}

impl OrderInput {
    /// Validate every field, collecting one message per failing field.
    pub fn validate(self) -> Result<ValidOrder, DomainError> {
        let mut errors = FieldErrors::new();

        let asset_name = clean(self.asset_name);
        if asset_name.is_none() {
            errors.add("assetName", "Asset name is required");
        }

        let quantity = integer(self.quantity.as_ref())
            .filter(|q| *q >= 1)
            .and_then(|q| u32::try_from(q).ok());
        if quantity.is_none() {
            if exceeds(self.quantity.as_ref(), u32::MAX) {
                errors.add("quantity", "Quantity is too large");
            } else {
                errors.add("quantity", "Quantity must be at least 1");
            }
        }

        let supplier = clean(self.supplier);
        if supplier.is_none() {
            errors.add("supplier", "Supplier is required");
        }

        let estimated_delivery = match clean(self.estimated_delivery) {
            None => {
                errors.add("estimatedDelivery", "Estimated delivery date is required");
                None
            }
            Some(raw) => {
                let parsed = parse_date(&raw);
                if parsed.is_none() {
                    errors.add("estimatedDelivery", "Estimated delivery date is invalid");
                }
                parsed
            }
        };

        let current_location = clean(self.current_location);
        if current_location.is_none() {
            errors.add("currentLocation", "Current location is required");
        }

        let status = match clean(self.status) {
            None => None,
            Some(raw) => {
                let parsed = OrderStatus::parse(&raw);
                if parsed.is_none() {
                    errors.add("status", "Invalid status");
                }
                parsed
            }
        };

        let order_date = errors.optional_date("orderDate", self.order_date, "Order date is invalid");

        match (asset_name, quantity, supplier, estimated_delivery, current_location) {
            (Some(asset_name), Some(quantity), Some(supplier), Some(estimated_delivery), Some(current_location))
                if errors.is_empty() =>
            {
                Ok(ValidOrder {
                    order_id: clean(self.order_id),
                    asset_name,
                    quantity,
                    supplier,
                    order_date,
                    estimated_delivery,
                    current_location,
                    status,
                    notes: clean(self.notes),
                })
            }
            _ => Err(DomainError::Fields(errors)),
        }
    }
}

/// `ORD-<last 6 digits of epoch millis>-<existing + 1>`.
pub fn generate_order_id(now_millis: i64, existing_orders: u64) -> String {
    format!("ORD-{:06}-{}", now_millis.rem_euclid(1_000_000), existing_orders + 1)
}

impl Order {
    /// Create an order whose history starts at its initial status.
    pub fn create(
        org_id: OrgId,
        input: ValidOrder,
        order_id: String,
        created_by: Option<OrderCreator>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = input.status.unwrap_or_default();
        Self {
            id: RecordId::new(),
            org_id,
            order_id,
            asset_name: input.asset_name,
            quantity: input.quantity,
            supplier: input.supplier,
            order_date: input.order_date.unwrap_or(now),
            estimated_delivery: input.estimated_delivery,
            current_location: input.current_location,
            status,
            tracking_history: vec![TrackingEntry { stage: status, date: now }],
            notes: input.notes,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`, recording the stage in the history.
    pub fn transition(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.tracking_history.push(TrackingEntry { stage: status, date: at });
        self.updated_at = at;
    }

    /// Full update. A status change goes through [`Order::transition`].
    pub fn apply_update(&mut self, input: ValidOrder, at: DateTime<Utc>) {
        if let Some(order_id) = input.order_id {
            self.order_id = order_id;
        }
        self.asset_name = input.asset_name;
        self.quantity = input.quantity;
        self.supplier = input.supplier;
        if let Some(order_date) = input.order_date {
            self.order_date = order_date;
        }
        self.estimated_delivery = input.estimated_delivery;
        self.current_location = input.current_location;
        self.notes = input.notes;
        self.updated_at = at;

        if let Some(status) = input.status.filter(|s| *s != self.status) {
            self.transition(status, at);
        }
    }

    /// Stage of the latest history entry.
    pub fn current_stage(&self) -> Option<OrderStatus> {
        self.tracking_history.last().map(|e| e.stage)
    }

    /// One CSV row, matching [`EXPORT_FIELDS`].
    pub fn export_row(&self) -> Vec<String> {
        vec![
            self.order_id.clone(),
            self.asset_name.clone(),
            self.quantity.to_string(),
            self.supplier.clone(),
            self.order_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.estimated_delivery.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.current_location.clone(),
            self.status.as_str().to_string(),
        ]
    }
}

impl Record for Order {
    const COLLECTION: &'static str = "orders";
    const SEARCH_FIELDS: &'static [&'static str] = &["orderId", "assetName", "supplier"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["orderId"];

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
            "orderId" => Some(Cow::Borrowed(&self.order_id)),
            "assetName" => Some(Cow::Borrowed(&self.asset_name)),
            "supplier" => Some(Cow::Borrowed(&self.supplier)),
            "currentLocation" => Some(Cow::Borrowed(&self.current_location)),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn widget_input() -> OrderInput {
        serde_json::from_value(json!({
            "assetName": "Widget",
            "quantity": 3,
            "supplier": "Acme",
            "estimatedDelivery": "2025-01-01",
            "currentLocation": "WH1"
        }))
        .unwrap()
    }

    fn widget_order() -> Order {
        let valid = widget_input().validate().unwrap();
        Order::create(OrgId::new(), valid, "ORD-000001-1".into(), None, itrax_core::time::now())
    }

    #[test]
    fn new_order_starts_ordered_with_one_history_entry() {
        let order = widget_order();
        assert_eq!(order.status, OrderStatus::Ordered);
        assert_eq!(order.tracking_history.len(), 1);
        assert_eq!(order.current_stage(), Some(OrderStatus::Ordered));
        assert_eq!(order.quantity, 3);
    }

    #[test]
    fn initial_status_seeds_the_history() {
        let mut input = widget_input();
        input.status = Some("Processing".into());
        let order = Order::create(OrgId::new(), input.validate().unwrap(), "X".into(), None, Utc::now());
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.tracking_history[0].stage, OrderStatus::Processing);
    }

    #[test]
    fn validation_reports_every_failing_field() {
        let input: OrderInput = serde_json::from_value(json!({
            "quantity": 0,
            "estimatedDelivery": "soon",
            "status": "Lost"
        }))
        .unwrap();

        let Err(DomainError::Fields(errors)) = input.validate() else {
            panic!("expected field errors");
        };
        assert_eq!(errors.get("assetName"), Some("Asset name is required"));
        assert_eq!(errors.get("quantity"), Some("Quantity must be at least 1"));
        assert_eq!(errors.get("supplier"), Some("Supplier is required"));
        assert_eq!(errors.get("estimatedDelivery"), Some("Estimated delivery date is invalid"));
        assert_eq!(errors.get("currentLocation"), Some("Current location is required"));
        assert_eq!(errors.get("status"), Some("Invalid status"));
    }

    #[test]
    fn oversized_quantity_is_reported_as_too_large() {
        for raw in [json!(1e30), json!(4_294_967_296u64), json!("99999999999999999999")] {
            let mut input = widget_input();
            input.quantity = Some(raw);
            let Err(DomainError::Fields(errors)) = input.validate() else {
                panic!("expected field errors");
            };
            assert_eq!(errors.get("quantity"), Some("Quantity is too large"));
        }
    }

    #[test]
    fn quantity_may_arrive_as_a_string() {
        let mut input = widget_input();
        input.quantity = Some(json!("7"));
        assert_eq!(input.validate().unwrap().quantity, 7);
    }

    #[test]
    fn tracking_history_in_the_body_is_ignored() {
        let input: OrderInput = serde_json::from_value(json!({
            "assetName": "Widget",
            "quantity": 1,
            "supplier": "Acme",
            "estimatedDelivery": "2025-01-01",
            "currentLocation": "WH1",
            "trackingHistory": [{"stage": "Delivered", "date": "2025-01-01T00:00:00Z"}]
        }))
        .unwrap();
        let order = Order::create(OrgId::new(), input.validate().unwrap(), "X".into(), None, Utc::now());
        assert_eq!(order.tracking_history.len(), 1);
    }

    #[test]
    fn update_with_new_status_appends_history() {
        let mut order = widget_order();
        let mut input = widget_input();
        input.status = Some("Shipped".into());
        input.supplier = Some("Globex".into());

        order.apply_update(input.validate().unwrap(), Utc::now());
        assert_eq!(order.supplier, "Globex");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.tracking_history.len(), 2);

        // Same status again: no new entry.
        let mut input = widget_input();
        input.status = Some("Shipped".into());
        order.apply_update(input.validate().unwrap(), Utc::now());
        assert_eq!(order.tracking_history.len(), 2);
    }

    #[test]
    fn status_may_regress() {
        let mut order = widget_order();
        order.transition(OrderStatus::Delivered, Utc::now());
        order.transition(OrderStatus::Processing, Utc::now());
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.tracking_history.len(), 3);
    }

    #[test]
    fn generated_ids_use_last_six_millis_digits() {
        assert_eq!(generate_order_id(1_736_000_123_456, 0), "ORD-123456-1");
        assert_eq!(generate_order_id(1_736_000_000_042, 9), "ORD-000042-10");
    }

    #[test]
    fn export_row_matches_header() {
        let order = widget_order();
        let row = order.export_row();
        assert_eq!(row.len(), EXPORT_FIELDS.len());
        assert_eq!(row[0], "ORD-000001-1");
        assert_eq!(row[2], "3");
        assert_eq!(row[5], "2025-01-01T00:00:00.000Z");
        assert_eq!(row[7], "Ordered");
    }

    fn any_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every transition appends exactly one entry and the status
        /// always equals the latest stage.
        #[test]
        fn status_tracks_latest_history_entry(
            stages in prop::collection::vec(any_status(), 0..20)
        ) {
            let mut order = widget_order();
            for (i, stage) in stages.iter().enumerate() {
                order.transition(*stage, Utc::now());
                prop_assert_eq!(order.tracking_history.len(), i + 2);
                prop_assert_eq!(order.current_stage(), Some(order.status));
            }
        }
    }
}
