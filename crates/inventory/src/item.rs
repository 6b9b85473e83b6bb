use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use itrax_core::validation::{clean, exceeds, integer, is_present, number};
use itrax_core::{DomainError, FieldErrors, OrgId, Record, RecordId};

/// A stocked consumable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub reorder_level: u32,
    #[serde(default)]
    pub cost_per_item: f64,
    #[serde(default)]
    pub created_by: Option<RecordId>,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<Value>,
    pub reorder_level: Option<Value>,
    pub cost_per_item: Option<Value>,
}

/// API representation: the stored item plus derived stock figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub low_stock: bool,
    pub total_value: f64,
}

impl InventoryItem {
    pub fn create(
        org_id: OrgId,
        input: InventoryInput,
        created_by: Option<RecordId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut item = Self {
            id: RecordId::new(),
            org_id,
            name: String::new(),
            description: None,
            location: None,
            sku: None,
            quantity: 0,
            reorder_level: 0,
            cost_per_item: 0.0,
            created_by,
            created_at: now,
            updated_at: now,
        };
        item.apply_update(input, now)?;
        Ok(item)
    }

    /// Validate and replace every editable field; stock can never go negative.
    pub fn apply_update(&mut self, input: InventoryInput, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();

        let name = clean(input.name);
        if name.is_none() {
            errors.add("name", "Item name is required");
        }

        let quantity = if is_present(input.quantity.as_ref()) {
            let q = integer(input.quantity.as_ref()).and_then(|q| u32::try_from(q).ok());
            if q.is_none() {
                if exceeds(input.quantity.as_ref(), u32::MAX) {
                    errors.add("quantity", "Quantity is too large");
                } else {
                    errors.add("quantity", "Quantity cannot be negative");
                }
            }
            q
        } else {
            errors.add("quantity", "Quantity is required");
            None
        };

        let reorder_level = if is_present(input.reorder_level.as_ref()) {
            integer(input.reorder_level.as_ref())
                .and_then(|r| u32::try_from(r).ok())
                .unwrap_or_else(|| {
                    errors.add("reorderLevel", "Reorder level cannot be negative");
                    0
                })
        } else {
            0
        };

        let cost_per_item = if is_present(input.cost_per_item.as_ref()) {
            number(input.cost_per_item.as_ref())
                .filter(|c| *c >= 0.0)
                .unwrap_or_else(|| {
                    errors.add("costPerItem", "Cost per item cannot be negative");
                    0.0
                })
        } else {
            0.0
        };

        let (Some(name), Some(quantity)) = (name, quantity) else {
            return Err(DomainError::Fields(errors));
        };
        errors.into_result()?;

        self.name = name;
        self.description = clean(input.description);
        self.location = clean(input.location);
        self.sku = clean(input.sku);
        self.quantity = quantity;
        self.reorder_level = reorder_level;
        self.cost_per_item = cost_per_item;
        self.updated_at = at;
        Ok(())
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn total_value(&self) -> f64 {
        f64::from(self.quantity) * self.cost_per_item
    }

    pub fn view(self) -> InventoryItemView {
        InventoryItemView {
            low_stock: self.is_low_stock(),
            total_value: self.total_value(),
            item: self,
        }
    }
}

impl Record for InventoryItem {
    const COLLECTION: &'static str = "inventory_items";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description", "sku"];

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
            "name" => Some(Cow::Borrowed(&self.name)),
            "description" => self.description.as_deref().map(Cow::Borrowed),
            "location" => self.location.as_deref().map(Cow::Borrowed),
            "sku" => self.sku.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
}
