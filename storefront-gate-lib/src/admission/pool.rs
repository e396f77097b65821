use ahash::AHashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::admission::bucket::Bucket;
use crate::admission::class::BucketSpec;
use crate::admission::clock::Clock;

/// Concurrent key -> bucket map for one traffic class.
///
/// Buckets are created lazily on first use. Concurrent first access for the same key yields a
/// single bucket shared by every caller.
#[derive(Debug)]
pub struct BucketPool {
    spec: BucketSpec,
    clock: Arc<dyn Clock>,
    buckets: RwLock<AHashMap<String, Arc<Bucket>>>,
}

impl BucketPool {
    pub fn new(spec: BucketSpec, clock: Arc<dyn Clock>) -> Self {
        Self { spec, clock, buckets: RwLock::new(AHashMap::new()) }
    }

    pub fn spec(&self) -> BucketSpec {
        self.spec
    }

    /// Return the bucket for `key`, creating it if this is the first time the key is seen.
    pub fn get_or_create(&self, key: &str) -> Arc<Bucket> {
        if let Some(bucket) = self.read().get(key) {
            return Arc::clone(bucket);
        }

        // Re-check under the write lock: another caller may have inserted in between.
        let mut buckets = self.write();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Bucket::new(self.spec, Arc::clone(&self.clock))));
        Arc::clone(bucket)
    }

    /// Return the bucket for `key` without creating one.
    pub fn get(&self, key: &str) -> Option<Arc<Bucket>> {
        self.read().get(key).cloned()
    }

    /// Drop the bucket for `key`. Returns `true` if one existed.
    pub fn clear(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Drop every bucket. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut buckets = self.write();
        let removed = buckets.len();
        buckets.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, AHashMap<String, Arc<Bucket>>> {
        match self.buckets.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Bucket pool lock poisoned");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, AHashMap<String, Arc<Bucket>>> {
        match self.buckets.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Bucket pool lock poisoned");
                poisoned.into_inner()
            }
        }
    }
}
