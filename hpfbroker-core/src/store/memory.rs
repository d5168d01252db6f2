//! In-memory engine for tests and ephemeral runs

use super::{Bucket, KvStore};
use crate::error::BrokerResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Ordered maps behind a single async lock. Writers are exclusive and
/// readers only ever see whole writes.
#[derive(Debug)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<Bucket, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let buckets = Bucket::ALL
            .into_iter()
            .map(|bucket| (bucket, BTreeMap::new()))
            .collect();

        Self {
            buckets: RwLock::new(buckets),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, bucket: Bucket, key: &str) -> BrokerResult<Option<Vec<u8>>> {
        let buckets = self.buckets.read().await;
        Ok(buckets.get(&bucket).and_then(|b| b.get(key)).cloned())
    }

    async fn put(&self, bucket: Bucket, key: &str, value: Vec<u8>) -> BrokerResult<()> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> BrokerResult<()> {
        let mut buckets = self.buckets.write().await;
        if let Some(b) = buckets.get_mut(&bucket) {
            b.remove(key);
        }
        Ok(())
    }

    async fn list(&self, bucket: Bucket) -> BrokerResult<Vec<Vec<u8>>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(&bucket)
            .map(|b| b.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, bucket: Bucket) -> BrokerResult<()> {
        let mut buckets = self.buckets.write().await;
        buckets.insert(bucket, BTreeMap::new());
        Ok(())
    }
}
