//! MongoDB implementation of [`Repository`].
//!
//! Documents are stored exactly as records serialize: `_id` and `orgId` are
//! UUID strings and `createdAt` is a fixed-width RFC 3339 string, so sorting on
//! `{createdAt: -1, _id: -1}` gives the same order as the in-memory backend.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{FindOneOptions, FindOptions, IndexOptions};
use mongodb::{Collection, Cursor, Database, IndexModel};

use itrax_core::{OrgId, Page, PageRequest, Record, RecordId};

use super::{Filter, Repository, StoreError};

/// Server error code for unique index violations.
const DUPLICATE_KEY: i32 = 11000;

pub struct MongoRepository<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T: Record> MongoRepository<T> {
    /// Open the record's collection and make sure its indexes exist.
    pub async fn new(database: &Database) -> Result<Self, StoreError> {
        let collection = database.collection::<T>(T::COLLECTION);
        let repo = Self { collection };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StoreError> {
        for field in T::UNIQUE_FIELDS {
            let mut keys = doc! { "orgId": 1 };
            keys.insert(*field, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(unique_index_name(field))
                        .build(),
                )
                .build();
            self.collection.create_index(index).await.map_err(store_error::<T>)?;
        }

        let listing = IndexModel::builder()
            .keys(doc! { "orgId": 1, "createdAt": -1 })
            .build();
        self.collection.create_index(listing).await.map_err(store_error::<T>)?;

        Ok(())
    }

    async fn drain(mut cursor: Cursor<T>) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        while cursor.advance().await.map_err(store_error::<T>)? {
            out.push(cursor.deserialize_current().map_err(store_error::<T>)?);
        }
        Ok(out)
    }
}

fn unique_index_name(field: &str) -> String {
    format!("{field}_unique")
}

fn newest_first() -> Document {
    doc! { "createdAt": -1, "_id": -1 }
}

fn by_id(org_id: OrgId, id: RecordId) -> Document {
    doc! { "_id": id.to_string(), "orgId": org_id.to_string() }
}

/// Escape regex metacharacters so search text matches literally.
fn escape_regex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Translate a [`Filter`] into a Mongo query document.
fn to_document<T: Record>(filter: &Filter) -> Document {
    let mut query = Document::new();
    if let Some(org_id) = filter.org_id {
        query.insert("orgId", org_id.to_string());
    }
    for (field, value) in &filter.equals {
        query.insert(field.clone(), value.clone());
    }
    if let Some(id) = filter.exclude_id {
        query.insert("_id", doc! { "$ne": id.to_string() });
    }
    if let Some(search) = &filter.search {
        if T::SEARCH_FIELDS.is_empty() {
            // Nothing to search in: match nothing, as the in-memory filter does.
            query.insert("$nor", vec![Bson::Document(Document::new())]);
        } else {
            let pattern = escape_regex(search);
            let clauses: Vec<Bson> = T::SEARCH_FIELDS
                .iter()
                .map(|field| {
                    let mut clause = Document::new();
                    clause.insert(*field, doc! { "$regex": pattern.clone(), "$options": "i" });
                    Bson::Document(clause)
                })
                .collect();
            query.insert("$or", clauses);
        }
    }
    query
}

fn store_error<T: Record>(err: MongoError) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write)) = err.kind.as_ref() {
        if write.code == DUPLICATE_KEY {
            let field = T::UNIQUE_FIELDS
                .iter()
                .find(|f| write.message.contains(&unique_index_name(f)))
                .copied()
                .unwrap_or("_id");
            return StoreError::Duplicate { field: field.to_string() };
        }
    }
    tracing::error!(collection = T::COLLECTION, error = %err, "mongo operation failed");
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl<T: Record> Repository<T> for MongoRepository<T> {
    fn backend(&self) -> &'static str {
        "mongo"
    }

    async fn get(&self, org_id: OrgId, id: RecordId) -> Result<Option<T>, StoreError> {
        self.collection
            .find_one(by_id(org_id, id))
            .await
            .map_err(store_error::<T>)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        self.collection
            .find_one(to_document::<T>(filter))
            .with_options(FindOneOptions::builder().sort(newest_first()).build())
            .await
            .map_err(store_error::<T>)
    }

    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        self.collection
            .insert_one(record)
            .await
            .map_err(store_error::<T>)?;
        Ok(())
    }

    async fn replace(&self, record: &T) -> Result<bool, StoreError> {
        let result = self
            .collection
            .replace_one(by_id(record.org_id(), record.id()), record)
            .await
            .map_err(store_error::<T>)?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, org_id: OrgId, id: RecordId) -> Result<Option<T>, StoreError> {
        self.collection
            .find_one_and_delete(by_id(org_id, id))
            .await
            .map_err(store_error::<T>)
    }

    async fn list(&self, filter: &Filter, page: PageRequest) -> Result<Page<T>, StoreError> {
        let query = to_document::<T>(filter);
        let total = self
            .collection
            .count_documents(query.clone())
            .await
            .map_err(store_error::<T>)?;

        let options = FindOptions::builder()
            .sort(newest_first())
            // BSON carries skip as a signed 64-bit value.
            .skip(page.offset().min(i64::MAX as u64))
            .limit(page.limit() as i64)
            .build();
        let cursor = self
            .collection
            .find(query)
            .with_options(options)
            .await
            .map_err(store_error::<T>)?;

        Ok(Page::new(Self::drain(cursor).await?, total, page))
    }

    async fn find_all(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        let options = FindOptions::builder().sort(newest_first()).build();
        let cursor = self
            .collection
            .find(to_document::<T>(filter))
            .with_options(options)
            .await
            .map_err(store_error::<T>)?;
        Self::drain(cursor).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.collection
            .count_documents(to_document::<T>(filter))
            .await
            .map_err(store_error::<T>)
    }
}
