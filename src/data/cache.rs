//! Session cache keyed by structural request equality.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// Memoizes successful results per key for the life of the cache.
///
/// The map lock is held while a value is being produced, so a key is
/// populated at most once even with concurrent callers. Failed productions
/// are not stored.
pub struct RequestCache<K, V> {
    entries: Mutex<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash + Clone, V> RequestCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.lock().get(key).cloned()
    }

    /// Return the cached value for `key`, or produce, store, and return it.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        produce: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let mut entries = self.lock();
        if let Some(hit) = entries.get(key) {
            return Ok(Arc::clone(hit));
        }
        let value = Arc::new(produce()?);
        entries.insert(key.clone(), Arc::clone(&value));
        Ok(value)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<V>>> {
        // A panic while producing leaves the map itself consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K: Eq + Hash + Clone, V> Default for RequestCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populates_once_and_skips_failures() {
        let cache: RequestCache<String, u32> = RequestCache::new();
        let mut calls = 0;

        let err: Result<_, &str> = cache.get_or_try_insert_with(&"k".to_string(), || {
            calls += 1;
            Err("boom")
        });
        assert!(err.is_err());
        assert!(cache.get(&"k".to_string()).is_none());

        for _ in 0..3 {
            let v = cache
                .get_or_try_insert_with(&"k".to_string(), || {
                    calls += 1;
                    Ok::<_, &str>(7)
                })
                .unwrap();
            assert_eq!(*v, 7);
        }
        assert_eq!(calls, 2);
        assert_eq!(cache.get(&"k".to_string()).as_deref(), Some(&7));

        cache.clear();
        assert!(cache.get(&"k".to_string()).is_none());
    }
}
