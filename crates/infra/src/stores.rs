//! Backend selection and the per-collection repository set.
//!
//! The backend is chosen exactly once at startup; handlers only ever see
//! `Arc<dyn Repository<_>>` and never learn which one they got.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use thiserror::Error;

use itrax_assets::{Asset, Category, Location};
use itrax_auth::User;
use itrax_inventory::InventoryItem;
use itrax_licenses::License;
use itrax_notifications::Notification;
use itrax_orders::Order;

use crate::store::{InMemoryRepository, MongoRepository, Repository, StoreError};

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(2);
const PING_TIMEOUT: Duration = Duration::from_secs(3);

/// Which storage backend to run against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// Try MongoDB, fall back to memory when it is unreachable.
    #[default]
    Auto,
    Mongo,
    Memory,
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("mongo connection failed: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("mongo did not answer ping within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Every repository the API needs, all on the same backend.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn Repository<User>>,
    pub assets: Arc<dyn Repository<Asset>>,
    pub categories: Arc<dyn Repository<Category>>,
    pub locations: Arc<dyn Repository<Location>>,
    pub licenses: Arc<dyn Repository<License>>,
    pub inventory: Arc<dyn Repository<InventoryItem>>,
    pub orders: Arc<dyn Repository<Order>>,
    pub notifications: Arc<dyn Repository<Notification>>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").field("backend", &self.backend()).finish()
    }
}

impl Stores {
    /// Fresh, empty in-memory stores. Data lives as long as this value.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::new()),
            assets: Arc::new(InMemoryRepository::new()),
            categories: Arc::new(InMemoryRepository::new()),
            locations: Arc::new(InMemoryRepository::new()),
            licenses: Arc::new(InMemoryRepository::new()),
            inventory: Arc::new(InMemoryRepository::new()),
            orders: Arc::new(InMemoryRepository::new()),
            notifications: Arc::new(InMemoryRepository::new()),
        }
    }

    /// Mongo-backed stores; creates indexes on first use of each collection.
    pub async fn mongo(database: &Database) -> Result<Self, StoreError> {
        Ok(Self {
            users: Arc::new(MongoRepository::<User>::new(database).await?),
            assets: Arc::new(MongoRepository::<Asset>::new(database).await?),
            categories: Arc::new(MongoRepository::<Category>::new(database).await?),
            locations: Arc::new(MongoRepository::<Location>::new(database).await?),
            licenses: Arc::new(MongoRepository::<License>::new(database).await?),
            inventory: Arc::new(MongoRepository::<InventoryItem>::new(database).await?),
            orders: Arc::new(MongoRepository::<Order>::new(database).await?),
            notifications: Arc::new(MongoRepository::<Notification>::new(database).await?),
        })
    }

    pub fn backend(&self) -> &'static str {
        self.users.backend()
    }

    /// Pick the backend for the lifetime of the process.
    pub async fn select(mode: BackendMode, uri: &str, db_name: &str) -> Result<Self, ConnectError> {
        match mode {
            BackendMode::Memory => {
                tracing::info!("using in-memory store");
                Ok(Self::in_memory())
            }
            BackendMode::Mongo => {
                let stores = Self::open_mongo(uri, db_name).await?;
                tracing::info!(db = db_name, "using mongo store");
                Ok(stores)
            }
            BackendMode::Auto => match Self::open_mongo(uri, db_name).await {
                Ok(stores) => {
                    tracing::info!(db = db_name, "using mongo store");
                    Ok(stores)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "mongo unavailable; falling back to in-memory store");
                    Ok(Self::in_memory())
                }
            },
        }
    }

    async fn open_mongo(uri: &str, db_name: &str) -> Result<Self, ConnectError> {
        let database = connect_mongo(uri, db_name).await?;
        Ok(Self::mongo(&database).await?)
    }
}

/// Connect and ping, giving up after a few seconds.
pub async fn connect_mongo(uri: &str, db_name: &str) -> Result<Database, ConnectError> {
    let mut options = ClientOptions::parse(uri).await?;
    options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
    options.connect_timeout = Some(SERVER_SELECTION_TIMEOUT);

    let client = Client::with_options(options)?;
    let database = client.database(db_name);

    tokio::time::timeout(PING_TIMEOUT, database.run_command(doc! { "ping": 1 }))
        .await
        .map_err(|_| ConnectError::Timeout(PING_TIMEOUT))??;

    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_mode_parses_env_values() {
        assert_eq!("".parse::<BackendMode>().unwrap(), BackendMode::Auto);
        assert_eq!("Mongo".parse::<BackendMode>().unwrap(), BackendMode::Mongo);
        assert_eq!(" memory ".parse::<BackendMode>().unwrap(), BackendMode::Memory);
        assert!("postgres".parse::<BackendMode>().is_err());
    }

    #[tokio::test]
    async fn memory_mode_never_touches_mongo() {
        let stores = Stores::select(BackendMode::Memory, "mongodb://invalid:1", "x")
            .await
            .unwrap();
        assert_eq!(stores.backend(), "memory");
    }

    #[tokio::test]
    async fn in_memory_stores_are_independent_instances() {
        use itrax_core::{OrgId, Record};
        use itrax_notifications::{Notification, NotificationKind};

        let a = Stores::in_memory();
        let b = Stores::in_memory();
        let org = OrgId::new();
        let note = Notification::new(org, itrax_core::RecordId::new(), NotificationKind::Info, "t", "m");
        a.notifications.insert(&note).await.unwrap();

        assert!(a.notifications.get(org, note.id()).await.unwrap().is_some());
        assert!(b.notifications.get(org, note.id()).await.unwrap().is_none());
    }
}
