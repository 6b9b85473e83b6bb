//! Document storage boundary.
//!
//! One [`Repository`] contract, two implementations (in-memory and MongoDB)
//! that answer every query identically: org scoping, equality filters,
//! case-insensitive search, newest-first ordering and offset pagination.

pub mod in_memory;
pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

use itrax_core::{OrgId, Page, PageRequest, Record, RecordId};

pub use in_memory::InMemoryRepository;
pub use mongo::MongoRepository;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A per-org unique field already holds this value.
    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Query over one collection.
///
/// Field names are the serialized (camelCase) names; see [`Record::field`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub org_id: Option<OrgId>,
    pub equals: Vec<(String, String)>,
    pub search: Option<String>,
    pub exclude_id: Option<RecordId>,
}

impl Filter {
    /// Everything owned by `org`.
    pub fn org(org_id: OrgId) -> Self {
        Self {
            org_id: Some(org_id),
            ..Self::default()
        }
    }

    pub fn eq(mut self, field: &str, value: impl Into<String>) -> Self {
        self.equals.push((field.to_string(), value.into()));
        self
    }

    /// Add an equality clause only when `value` is non-blank (query-string filters).
    pub fn eq_opt(self, field: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    /// Case-insensitive substring search; blank input is ignored.
    pub fn search(mut self, text: Option<&str>) -> Self {
        self.search = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }

    pub fn exclude(mut self, id: RecordId) -> Self {
        self.exclude_id = Some(id);
        self
    }

    /// Evaluate the filter against a record in memory.
    pub fn matches<T: Record>(&self, record: &T) -> bool {
        if self.org_id.is_some_and(|org| record.org_id() != org) {
            return false;
        }
        if self.exclude_id.is_some_and(|id| record.id() == id) {
            return false;
        }
        let equals = self
            .equals
            .iter()
            .all(|(field, value)| record.field(field).as_deref() == Some(value.as_str()));
        if !equals {
            return false;
        }
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                T::SEARCH_FIELDS.iter().any(|field| {
                    record
                        .field(field)
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

/// Async, object-safe document repository for one record type.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// Short backend name for health/logging (`"mongo"`, `"memory"`).
    fn backend(&self) -> &'static str;

    async fn get(&self, org_id: OrgId, id: RecordId) -> Result<Option<T>, StoreError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when a unique field collides.
    async fn insert(&self, record: &T) -> Result<(), StoreError>;

    /// Overwrite an existing record. `Ok(false)` when it does not exist.
    async fn replace(&self, record: &T) -> Result<bool, StoreError>;

    async fn delete(&self, org_id: OrgId, id: RecordId) -> Result<Option<T>, StoreError>;

    /// One page, newest first, plus the total match count.
    async fn list(&self, filter: &Filter, page: PageRequest) -> Result<Page<T>, StoreError>;

    /// Every match, newest first (exports and reports).
    async fn find_all(&self, filter: &Filter) -> Result<Vec<T>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;
}
