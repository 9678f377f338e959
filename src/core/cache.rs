//! Bounded TTL cache with an injected clock
//!
//! Used for slow-changing lookups such as template configurations. Entries
//! expire after a fixed TTL; when refreshing an expired entry fails, the stale
//! value is served instead of the error. The capacity bound is enforced by an
//! [`LruCache`], so the least recently used entry is evicted first. Row-index
//! arithmetic never goes through this cache.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Where a cached value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from a fresh entry
    Hit,
    /// Loaded (entry missing or expired)
    Loaded,
    /// Refresh failed; an expired entry was served
    Stale,
}

/// Read-through cache with TTL expiry and a capacity bound
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<LruCache<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache; a capacity of 0 is treated as 1
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            clock,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the fresh cached value, if any
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        entries
            .get(key)
            .filter(|entry| now.duration_since(entry.stored_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Stores a value, evicting the least recently used entry when full
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        self.lock().put(
            key,
            Entry {
                value,
                stored_at: now,
            },
        );
    }

    /// Returns the cached value or loads it
    ///
    /// The loader runs without holding the cache lock. If it fails and an
    /// expired entry exists, that entry is returned as [`CacheOutcome::Stale`].
    pub fn get_or_load<E, F>(&self, key: &K, load: F) -> Result<(V, CacheOutcome), E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok((value, CacheOutcome::Hit));
        }

        match load() {
            Ok(value) => {
                self.insert(key.clone(), value.clone());
                Ok((value, CacheOutcome::Loaded))
            }
            Err(err) => {
                let stale = self.lock().peek(key).map(|entry| entry.value.clone());
                match stale {
                    Some(value) => Ok((value, CacheOutcome::Stale)),
                    None => Err(err),
                }
            }
        }
    }

    pub fn invalidate(&self, key: &K) {
        self.lock().pop(key);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, Entry<V>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
