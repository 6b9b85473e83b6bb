use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use itrax_core::validation::{clean, integer, is_present};
use itrax_core::{DomainError, FieldErrors, OrgId, Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocationType {
    #[default]
    Office,
    Warehouse,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Office => "Office",
            LocationType::Warehouse => "Warehouse",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Office" => Some(LocationType::Office),
            "Warehouse" => Some(LocationType::Warehouse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocationStatus {
    #[default]
    Active,
    Inactive,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationStatus::Active => "Active",
            LocationStatus::Inactive => "Inactive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Active" => Some(LocationStatus::Active),
            "Inactive" => Some(LocationStatus::Inactive),
            _ => None,
        }
    }
}

/// An office or warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LocationType,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub capacity: u32,
    pub status: LocationStatus,
    #[serde(default)]
    pub created_by: Option<RecordId>,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub capacity: Option<Value>,
    pub status: Option<String>,
}

impl Location {
    pub fn create(
        org_id: OrgId,
        input: LocationInput,
        created_by: Option<RecordId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut location = Self {
            id: RecordId::new(),
            org_id,
            name: String::new(),
            kind: LocationType::default(),
            address: None,
            city: None,
            state: None,
            country: None,
            capacity: 0,
            status: LocationStatus::default(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        location.apply_update(input, now)?;
        Ok(location)
    }

    /// Validate `input` and replace every editable field; on error nothing changes.
    pub fn apply_update(&mut self, input: LocationInput, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();

        let name = clean(input.name);
        if name.is_none() {
            errors.add("name", "Location name is required");
        }

        let kind = match clean(input.kind) {
            None => LocationType::default(),
            Some(raw) => LocationType::parse(&raw).unwrap_or_else(|| {
                errors.add("type", "Type must be Office or Warehouse");
                LocationType::default()
            }),
        };

        let status = match clean(input.status) {
            None => LocationStatus::default(),
            Some(raw) => LocationStatus::parse(&raw).unwrap_or_else(|| {
                errors.add("status", "Status must be Active or Inactive");
                LocationStatus::default()
            }),
        };

        let capacity = if is_present(input.capacity.as_ref()) {
            integer(input.capacity.as_ref())
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or_else(|| {
                    errors.add("capacity", "Capacity must be a non-negative whole number");
                    0
                })
        } else {
            0
        };

        let Some(name) = name.filter(|_| errors.is_empty()) else {
            return Err(DomainError::Fields(errors));
        };

        self.name = name;
        self.kind = kind;
        self.address = clean(input.address);
        self.city = clean(input.city);
        self.state = clean(input.state);
        self.country = clean(input.country);
        self.capacity = capacity;
        self.status = status;
        self.updated_at = at;
        Ok(())
    }
}

impl Record for Location {
    const COLLECTION: &'static str = "locations";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "address", "city"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["name"];

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
            "type" => Some(Cow::Borrowed(self.kind.as_str())),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "address" => self.address.as_deref().map(Cow::Borrowed),
            "city" => self.city.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(body: Value) -> LocationInput {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn defaults_apply() {
        let loc = Location::create(OrgId::new(), input(json!({"name": "HQ"})), None, Utc::now()).unwrap();
        assert_eq!(loc.kind, LocationType::Office);
        assert_eq!(loc.status, LocationStatus::Active);
        assert_eq!(loc.capacity, 0);

        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["type"], "Office");
    }

    #[test]
    fn bad_values_leave_location_untouched() {
        let mut loc = Location::create(
            OrgId::new(),
            input(json!({"name": "Depot", "type": "Warehouse", "capacity": "250"})),
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(loc.capacity, 250);

        let err = loc
            .apply_update(input(json!({"name": "Depot", "type": "Garage", "capacity": -1})), Utc::now())
            .unwrap_err();
        let DomainError::Fields(errors) = err else { panic!("expected field errors") };
        assert!(errors.contains("type"));
        assert!(errors.contains("capacity"));
        assert_eq!(loc.kind, LocationType::Warehouse);
    }
}
