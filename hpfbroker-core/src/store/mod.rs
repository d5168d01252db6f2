//! Transactional key-value resource store
//!
//! Values live in named buckets, one per resource kind, keyed by the
//! resource's natural identifier and encoded as JSON. Every operation runs in
//! a single transaction of the underlying engine.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::{BrokerError, BrokerResult};
use crate::types::{Identity, User};
use crate::validation_error;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Named partition of the store
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
    Identities,
    Users,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Identities, Bucket::Users];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Identities => "identities",
            Bucket::Users => "users",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw byte-level engine underneath [`ResourceStore`]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value; `None` when the key is absent
    async fn get(&self, bucket: Bucket, key: &str) -> BrokerResult<Option<Vec<u8>>>;

    /// Insert or overwrite a value
    async fn put(&self, bucket: Bucket, key: &str, value: Vec<u8>) -> BrokerResult<()>;

    /// Remove a key; removing an absent key succeeds
    async fn delete(&self, bucket: Bucket, key: &str) -> BrokerResult<()>;

    /// All values ordered by the byte order of their keys
    async fn list(&self, bucket: Bucket) -> BrokerResult<Vec<Vec<u8>>>;

    /// Atomically remove every entry of a bucket, leaving it empty
    async fn clear(&self, bucket: Bucket) -> BrokerResult<()>;
}

/// An entity stored in its own bucket under its natural key
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    const BUCKET: Bucket;

    fn key(&self) -> &str;
}

impl Resource for Identity {
    const BUCKET: Bucket = Bucket::Identities;

    fn key(&self) -> &str {
        &self.ident
    }
}

impl Resource for User {
    const BUCKET: Bucket = Bucket::Users;

    fn key(&self) -> &str {
        &self.name
    }
}

/// Typed JSON layer over a [`KvStore`]
#[derive(Clone)]
pub struct ResourceStore {
    kv: Arc<dyn KvStore>,
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore").finish_non_exhaustive()
    }
}

impl ResourceStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Store backed by the in-memory engine
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Store backed by a SQLite database file (or `:memory:`)
    pub async fn sqlite(path: &str) -> BrokerResult<Self> {
        Ok(Self::new(Arc::new(SqliteStore::open(path).await?)))
    }

    pub async fn get<T: Resource>(&self, key: &str) -> BrokerResult<Option<T>> {
        match self.kv.get(T::BUCKET, key).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn exists<T: Resource>(&self, key: &str) -> BrokerResult<bool> {
        Ok(self.kv.get(T::BUCKET, key).await?.is_some())
    }

    pub async fn put<T: Resource>(&self, value: &T) -> BrokerResult<()> {
        if value.key().is_empty() {
            return Err(validation_error!("key must not be empty", T::BUCKET, "store"));
        }
        let raw = serde_json::to_vec(value)?;
        debug!(bucket = %T::BUCKET, key = value.key(), "put");
        self.kv.put(T::BUCKET, value.key(), raw).await
    }

    pub async fn delete<T: Resource>(&self, key: &str) -> BrokerResult<()> {
        debug!(bucket = %T::BUCKET, key, "delete");
        self.kv.delete(T::BUCKET, key).await
    }

    pub async fn list<T: Resource>(&self) -> BrokerResult<Vec<T>> {
        self.kv
            .list(T::BUCKET)
            .await?
            .iter()
            .map(|raw| serde_json::from_slice::<T>(raw).map_err(BrokerError::from))
            .collect()
    }

    pub async fn delete_all<T: Resource>(&self) -> BrokerResult<()> {
        debug!(bucket = %T::BUCKET, "clear");
        self.kv.clear(T::BUCKET).await
    }
}

/// Lookup the hpfeeds broker performs when a client authenticates
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn identify(&self, ident: &str) -> BrokerResult<Option<Identity>>;
}

#[async_trait]
impl IdentityLookup for ResourceStore {
    async fn identify(&self, ident: &str) -> BrokerResult<Option<Identity>> {
        self.get::<Identity>(ident).await
    }
}
