use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use itrax_core::validation::{clean, is_present, number};
use itrax_core::{DomainError, FieldErrors, OrgId, Record, RecordId};

/// Columns of the asset CSV export.
pub const EXPORT_FIELDS: [&str; 12] = [
    "assetTag",
    "name",
    "category",
    "manufacturer",
    "model",
    "serialNumber",
    "status",
    "location",
    "assignedTo",
    "purchaseDate",
    "warrantyExpiryDate",
    "cost",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AssetStatus {
    #[default]
    Available,
    Assigned,
    Maintenance,
    Retired,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 4] = [
        AssetStatus::Available,
        AssetStatus::Assigned,
        AssetStatus::Maintenance,
        AssetStatus::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "Available",
            AssetStatus::Assigned => "Assigned",
            AssetStatus::Maintenance => "Maintenance",
            AssetStatus::Retired => "Retired",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    pub asset_tag: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    pub status: AssetStatus,
    #[serde(default)]
    pub location: Option<String>,
    /// Display name of the employee holding the asset.
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub warranty_expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<RecordId>,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw create/update body.
///
/// Older clients send `assetId`, `currentLocation` and `currentEmployee`; they
/// are read as `assetTag`, `location` and `assignedTo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInput {
    pub asset_tag: Option<String>,
    pub asset_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub current_location: Option<String>,
    pub assigned_to: Option<String>,
    pub current_employee: Option<String>,
    pub purchase_date: Option<String>,
    pub warranty_expiry_date: Option<String>,
    pub cost: Option<Value>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidAsset {
    pub asset_tag: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub status: AssetStatus,
    pub location: Option<String>,
    pub assigned_to: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub warranty_expiry_date: Option<DateTime<Utc>>,
    pub cost: f64,
    pub notes: Option<String>,
}

impl AssetInput {
    pub fn validate(self) -> Result<ValidAsset, DomainError> {
        let mut errors = FieldErrors::new();

        let asset_tag = clean(self.asset_tag).or_else(|| clean(self.asset_id));
        if asset_tag.is_none() {
            errors.add("assetTag", "Asset tag is required");
        }

        let status = match clean(self.status) {
            None => AssetStatus::default(),
            Some(raw) => AssetStatus::parse(&raw).unwrap_or_else(|| {
                errors.add("status", "Invalid status");
                AssetStatus::default()
            }),
        };

        let cost = if is_present(self.cost.as_ref()) {
            match number(self.cost.as_ref()).filter(|c| *c >= 0.0) {
                Some(c) => c,
                None => {
                    errors.add("cost", "Cost must be a non-negative number");
                    0.0
                }
            }
        } else {
            0.0
        };

        let purchase_date = errors.optional_date("purchaseDate", self.purchase_date, "Purchase date is invalid");
        let warranty_expiry_date = errors.optional_date(
            "warrantyExpiryDate",
            self.warranty_expiry_date,
            "Warranty expiry date is invalid",
        );

        let Some(asset_tag) = asset_tag.filter(|_| errors.is_empty()) else {
            return Err(DomainError::Fields(errors));
        };

        let manufacturer = clean(self.manufacturer);
        let model = clean(self.model);
        let name = clean(self.name).unwrap_or_else(|| default_name(&asset_tag, manufacturer.as_deref(), model.as_deref()));

        Ok(ValidAsset {
            asset_tag,
            name,
            description: clean(self.description),
            category: clean(self.category),
            manufacturer,
            model,
            serial_number: clean(self.serial_number),
            status,
            location: clean(self.location).or_else(|| clean(self.current_location)),
            assigned_to: clean(self.assigned_to).or_else(|| clean(self.current_employee)),
            purchase_date,
            warranty_expiry_date,
            cost,
            notes: clean(self.notes),
        })
    }
}

/// "Manufacturer Model" when either is known, otherwise the tag.
fn default_name(tag: &str, manufacturer: Option<&str>, model: Option<&str>) -> String {
    let parts: Vec<&str> = [manufacturer, model].into_iter().flatten().collect();
    if parts.is_empty() { tag.to_string() } else { parts.join(" ") }
}

impl Asset {
    pub fn create(org_id: OrgId, input: ValidAsset, created_by: Option<RecordId>, now: DateTime<Utc>) -> Self {
        let mut asset = Self {
            id: RecordId::new(),
            org_id,
            asset_tag: String::new(),
            name: String::new(),
            description: None,
            category: None,
            manufacturer: None,
            model: None,
            serial_number: None,
            status: AssetStatus::default(),
            location: None,
            assigned_to: None,
            purchase_date: None,
            warranty_expiry_date: None,
            cost: 0.0,
            notes: None,
            created_by,
            created_at: now,
            updated_at: now,
        };
        asset.apply_update(input, now);
        asset
    }

    /// Replace every editable field, then re-derive the assignment status.
    pub fn apply_update(&mut self, input: ValidAsset, at: DateTime<Utc>) {
        self.asset_tag = input.asset_tag;
        self.name = input.name;
        self.description = input.description;
        self.category = input.category;
        self.manufacturer = input.manufacturer;
        self.model = input.model;
        self.serial_number = input.serial_number;
        self.status = input.status;
        self.location = input.location;
        self.assigned_to = input.assigned_to;
        self.purchase_date = input.purchase_date;
        self.warranty_expiry_date = input.warranty_expiry_date;
        self.cost = input.cost;
        self.notes = input.notes;
        self.updated_at = at;
        self.normalize_assignment();
    }

    /// An assigned asset is always `Assigned`; an `Assigned` asset without a
    /// holder goes back to `Available`.
    fn normalize_assignment(&mut self) {
        match (&self.assigned_to, self.status) {
            (Some(_), _) => self.status = AssetStatus::Assigned,
            (None, AssetStatus::Assigned) => self.status = AssetStatus::Available,
            (None, _) => {}
        }
    }

    pub fn export_row(&self) -> Vec<String> {
        let date = |d: &Option<DateTime<Utc>>| {
            d.map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true)).unwrap_or_default()
        };
        vec![
            self.asset_tag.clone(),
            self.name.clone(),
            self.category.clone().unwrap_or_default(),
            self.manufacturer.clone().unwrap_or_default(),
            self.model.clone().unwrap_or_default(),
            self.serial_number.clone().unwrap_or_default(),
            self.status.as_str().to_string(),
            self.location.clone().unwrap_or_default(),
            self.assigned_to.clone().unwrap_or_default(),
            date(&self.purchase_date),
            date(&self.warranty_expiry_date),
            self.cost.to_string(),
        ]
    }
}

impl Record for Asset {
    const COLLECTION: &'static str = "assets";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "assetTag", "description"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["assetTag"];

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
            "assetTag" => Some(Cow::Borrowed(&self.asset_tag)),
            "name" => Some(Cow::Borrowed(&self.name)),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "description" => text(&self.description),
            "category" => text(&self.category),
            "location" => text(&self.location),
            "assignedTo" => text(&self.assigned_to),
            "serialNumber" => text(&self.serial_number),
            _ => None,
        }
    }
}

fn text(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}
