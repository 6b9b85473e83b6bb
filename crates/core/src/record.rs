//! Persisted record contract.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::id::{OrgId, RecordId};

/// A document owned by an organization and stored in a named collection.
///
/// Field names used by [`Record::field`], [`Record::SEARCH_FIELDS`] and
/// [`Record::UNIQUE_FIELDS`] are the serialized (camelCase) names, so the
/// same filter means the same thing to every storage backend.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Collection name.
    const COLLECTION: &'static str;

    /// Fields matched by case-insensitive free-text search.
    const SEARCH_FIELDS: &'static [&'static str];

    /// Fields that must be unique within an organization.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> RecordId;

    fn org_id(&self) -> OrgId;

    fn created_at(&self) -> DateTime<Utc>;

    /// String value of a top-level field, or `None` when unset/unknown.
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}
