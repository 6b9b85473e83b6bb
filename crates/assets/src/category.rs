use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use itrax_core::validation::clean;
use itrax_core::{DomainError, OrgId, Record, RecordId};

/// Icon shown for a category when none is chosen.
pub const DEFAULT_ICON_KEY: &str = "Package";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub org_id: OrgId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub icon_key: String,
    #[serde(default)]
    pub created_by: Option<RecordId>,
    #[serde(with = "itrax_core::time::millis")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon_key: Option<String>,
}

impl Category {
    pub fn create(
        org_id: OrgId,
        input: CategoryInput,
        created_by: Option<RecordId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut category = Self {
            id: RecordId::new(),
            org_id,
            name: String::new(),
            description: None,
            icon_key: DEFAULT_ICON_KEY.to_string(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        category.apply_update(input, now)?;
        Ok(category)
    }

    pub fn apply_update(&mut self, input: CategoryInput, at: DateTime<Utc>) -> Result<(), DomainError> {
        let name = clean(input.name).ok_or_else(|| DomainError::validation("Category name is required"))?;
        self.name = name;
        self.description = clean(input.description);
        self.icon_key = clean(input.icon_key).unwrap_or_else(|| DEFAULT_ICON_KEY.to_string());
        self.updated_at = at;
        Ok(())
    }
}

impl Record for Category {
    const COLLECTION: &'static str = "categories";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];
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
            "description" => self.description.as_deref().map(Cow::Borrowed),
            "iconKey" => Some(Cow::Borrowed(&self.icon_key)),
            _ => None,
        }
    }
}
