use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use itrax_core::validation::{clean, integer, is_present, number};
use itrax_core::{DomainError, FieldErrors, OrgId, Page, PageRequest, Record, RecordId};

/// A license expiring within this many days is flagged for renewal.
pub const EXPIRING_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LicenseStatus {
    #[default]
    Active,
    #[serde(alias = "Expiring Soon")]
    ExpiringSoon,
    Expired,
}

impl LicenseStatus {
    pub const ALL: [LicenseStatus; 3] = [LicenseStatus::Active, LicenseStatus::ExpiringSoon, LicenseStatus::Expired];

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Active => "Active",
            LicenseStatus::ExpiringSoon => "ExpiringSoon",
            LicenseStatus::Expired => "Expired",
        }
    }

    /// Accepts the wire names plus the spaced `Expiring Soon` spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Active" => Some(LicenseStatus::Active),
            "ExpiringSoon" | "Expiring Soon" => Some(LicenseStatus::ExpiringSoon),
            "Expired" => Some(LicenseStatus::Expired),
            _ => None,
        }
    }
}

/// Status implied by an expiration date.
pub fn derive_status(expiration: DateTime<Utc>, now: DateTime<Utc>) -> LicenseStatus {
    if expiration < now {
        LicenseStatus::Expired
    } else if expiration <= now + Duration::days(EXPIRING_SOON_DAYS) {
        LicenseStatus::ExpiringSoon
    } else {
        LicenseStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    pub name: String,
    pub license_key: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seats: Option<u32>,
    #[serde(default)]
    pub seats_assigned: u32,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub status: LicenseStatus,
    #[serde(default)]
    pub created_by: Option<RecordId>,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInput {
    pub name: Option<String>,
    pub license_key: Option<String>,
    pub vendor: Option<String>,
    pub expiration_date: Option<String>,
    pub seats: Option<Value>,
    pub seats_assigned: Option<Value>,
    pub cost: Option<Value>,
    pub assigned_to: Option<String>,
    pub status: Option<String>,
}

impl License {
    pub fn create(
        org_id: OrgId,
        input: LicenseInput,
        created_by: Option<RecordId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut license = Self {
            id: RecordId::new(),
            org_id,
            name: String::new(),
            license_key: String::new(),
            vendor: None,
            expiration_date: None,
            seats: None,
            seats_assigned: 0,
            cost: 0.0,
            assigned_to: None,
            status: LicenseStatus::default(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        license.apply_update(input, now)?;
        Ok(license)
    }

    /// Validate and replace every editable field. The stored status is
    /// re-derived from the expiration date when there is one.
    pub fn apply_update(&mut self, input: LicenseInput, now: DateTime<Utc>) -> Result<(), DomainError> {
        let mut errors = FieldErrors::new();

        let name = clean(input.name);
        if name.is_none() {
            errors.add("name", "License name is required");
        }
        let license_key = clean(input.license_key);
        if license_key.is_none() {
            errors.add("licenseKey", "License key is required");
        }

        let expiration_date = errors.optional_date("expirationDate", input.expiration_date, "Expiration date is invalid");

        let seats = if is_present(input.seats.as_ref()) {
            let seats = integer(input.seats.as_ref())
                .filter(|s| *s >= 1)
                .and_then(|s| u32::try_from(s).ok());
            if seats.is_none() {
                errors.add("seats", "Seats must be at least 1");
            }
            seats
        } else {
            None
        };

        let seats_assigned = if is_present(input.seats_assigned.as_ref()) {
            integer(input.seats_assigned.as_ref())
                .and_then(|s| u32::try_from(s).ok())
                .unwrap_or_else(|| {
                    errors.add("seatsAssigned", "Assigned seats must be a non-negative whole number");
                    0
                })
        } else {
            0
        };
        if seats.is_some_and(|total| seats_assigned > total) {
            errors.add("seatsAssigned", "Assigned seats cannot exceed total seats");
        }

        let cost = if is_present(input.cost.as_ref()) {
            number(input.cost.as_ref()).filter(|c| *c >= 0.0).unwrap_or_else(|| {
                errors.add("cost", "Cost must be a non-negative number");
                0.0
            })
        } else {
            0.0
        };

        let requested = match clean(input.status) {
            None => LicenseStatus::default(),
            Some(raw) => LicenseStatus::parse(&raw).unwrap_or_else(|| {
                errors.add("status", "Invalid status");
                LicenseStatus::default()
            }),
        };

        let (Some(name), Some(license_key)) = (name, license_key) else {
            return Err(DomainError::Fields(errors));
        };
        errors.into_result()?;

        self.name = name;
        self.license_key = license_key;
        self.vendor = clean(input.vendor);
        self.expiration_date = expiration_date;
        self.seats = seats;
        self.seats_assigned = seats_assigned;
        self.cost = cost;
        self.assigned_to = clean(input.assigned_to);
        self.status = expiration_date.map_or(requested, |exp| derive_status(exp, now));
        self.updated_at = now;
        Ok(())
    }

    /// Status as of `now`, which may have moved on since the last write.
    pub fn status_at(&self, now: DateTime<Utc>) -> LicenseStatus {
        self.expiration_date
            .map_or(self.status, |exp| derive_status(exp, now))
    }
}

/// Re-derive every status as of `now`, keep the ones matching `status` and
/// cut out the requested page. Input order is preserved.
pub fn current_page(
    licenses: Vec<License>,
    status: Option<LicenseStatus>,
    request: PageRequest,
    now: DateTime<Utc>,
) -> Page<License> {
    let matching: Vec<License> = licenses
        .into_iter()
        .map(|mut license| {
            license.status = license.status_at(now);
            license
        })
        .filter(|license| status.is_none_or(|wanted| license.status == wanted))
        .collect();
    let total = matching.len() as u64;
    let items = matching
        .into_iter()
        .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
        .take(request.limit() as usize)
        .collect();
    Page::new(items, total, request)
}

impl Record for License {
    const COLLECTION: &'static str = "licenses";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "licenseKey", "vendor"];

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
            "licenseKey" => Some(Cow::Borrowed(&self.license_key)),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "vendor" => self.vendor.as_deref().map(Cow::Borrowed),
            "assignedTo" => self.assigned_to.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
}
