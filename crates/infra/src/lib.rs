//! Infrastructure layer: document storage and backend selection.

pub mod store;
pub mod stores;

pub use store::{Filter, InMemoryRepository, MongoRepository, Repository, StoreError};
pub use stores::{BackendMode, ConnectError, Stores, connect_mongo};
