use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use itrax_core::{OrgId, Page, PageRequest, Record, RecordId};

use super::{Filter, Repository, StoreError};

/// Org-isolated in-memory repository for tests/dev and as the fallback backend.
///
/// Each instance is an explicit object owned by the service graph; dropping
/// it drops the data.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    inner: RwLock<HashMap<(OrgId, RecordId), T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<(OrgId, RecordId), T>>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<(OrgId, RecordId), T>>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// First unique field of `record` already held by another record of its org.
fn unique_conflict<T: Record>(map: &HashMap<(OrgId, RecordId), T>, record: &T) -> Option<&'static str> {
    T::UNIQUE_FIELDS.iter().copied().find(|field| {
        let Some(value) = record.field(field) else {
            return false;
        };
        map.values().any(|other| {
            other.org_id() == record.org_id()
                && other.id() != record.id()
                && other.field(field).as_deref() == Some(value.as_ref())
        })
    })
}

/// Matches for `filter`, newest first (`createdAt` desc, then id desc).
fn sorted_matches<T: Record>(map: &HashMap<(OrgId, RecordId), T>, filter: &Filter) -> Vec<T> {
    let mut out: Vec<T> = map.values().filter(|r| filter.matches(*r)).cloned().collect();
    out.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
    out
}

#[async_trait]
impl<T: Record> Repository<T> for InMemoryRepository<T> {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, org_id: OrgId, id: RecordId) -> Result<Option<T>, StoreError> {
        Ok(self.read()?.get(&(org_id, id)).cloned())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        Ok(sorted_matches(&*self.read()?, filter).into_iter().next())
    }

    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let mut map = self.write()?;
        let key = (record.org_id(), record.id());
        if map.contains_key(&key) {
            return Err(StoreError::Duplicate { field: "_id".to_string() });
        }
        if let Some(field) = unique_conflict(&map, record) {
            return Err(StoreError::Duplicate { field: field.to_string() });
        }
        map.insert(key, record.clone());
        Ok(())
    }

    async fn replace(&self, record: &T) -> Result<bool, StoreError> {
        let mut map = self.write()?;
        let key = (record.org_id(), record.id());
        if !map.contains_key(&key) {
            return Ok(false);
        }
        if let Some(field) = unique_conflict(&map, record) {
            return Err(StoreError::Duplicate { field: field.to_string() });
        }
        map.insert(key, record.clone());
        Ok(true)
    }

    async fn delete(&self, org_id: OrgId, id: RecordId) -> Result<Option<T>, StoreError> {
        Ok(self.write()?.remove(&(org_id, id)))
    }

    async fn list(&self, filter: &Filter, page: PageRequest) -> Result<Page<T>, StoreError> {
        let all = sorted_matches(&*self.read()?, filter);
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn find_all(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        Ok(sorted_matches(&*self.read()?, filter))
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let map = self.read()?;
        Ok(map.values().filter(|r| filter.matches(*r)).count() as u64)
    }
}
