use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, Instant};

/// Lifetime of weather and icon entries
pub const CACHE_DURATION: Duration = Duration::from_secs(15 * 60);

/// A stored value and the local time it was fetched.
///
/// Entries are replaced, never mutated.
struct CacheEntry<V> {
    data: Arc<V>,
    timestamp: Instant,
}

/// Keyed cache whose entries expire `ttl` after they were stored.
///
/// Expiry is checked lazily on read; stale entries stay in place until the
/// next insert for the same key supersedes them. There is no capacity bound.
pub struct TtlCache<K, V> {
    cache: RwLock<HashMap<K, CacheEntry<V>>>,
    in_flight: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        self.get_at(key, Instant::now()).await
    }

    pub async fn get_at(&self, key: &K, now: Instant) -> Option<Arc<V>> {
        let cache = self.cache.read().await;
        if let Some(entry) = cache.get(key)
            && now.saturating_duration_since(entry.timestamp) < self.ttl
        {
            return Some(entry.data.clone());
        }
        None
    }

    pub async fn insert(&self, key: K, value: V) -> Arc<V> {
        self.insert_at(key, value, Instant::now()).await
    }

    pub async fn insert_at(&self, key: K, value: V, timestamp: Instant) -> Arc<V> {
        let data = Arc::new(value);
        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CacheEntry {
                data: data.clone(),
                timestamp,
            },
        );
        data
    }

    /// Return the live entry for `key`, or run `fetch` and store its result.
    ///
    /// Concurrent callers for the same key wait on one gate: the first runs
    /// `fetch`, the rest find its result in the cache. Failures are not cached,
    /// so a waiter behind a failed fetch runs its own.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            return Ok(hit);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(key.clone()).or_default().clone()
        };

        let result = {
            let _turn = gate.lock().await;
            match self.get(&key).await {
                Some(hit) => Ok(hit),
                None => match fetch().await {
                    Ok(value) => Ok(self.insert(key.clone(), value).await),
                    Err(e) => Err(e),
                },
            }
        };

        // Gates are only cloned under this lock, so once ours is dropped a
        // count of one means nobody else is queued.
        let mut in_flight = self.in_flight.lock().await;
        drop(gate);
        if in_flight
            .get(&key)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            in_flight.remove(&key);
        }

        result
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn hit_within_ttl_returns_same_allocation() {
        let cache = TtlCache::with_ttl(CACHE_DURATION);
        let start = Instant::now();
        let stored = cache.insert_at("Bergen", 7_u32, start).await;

        let later = cache
            .get_at(&"Bergen", start + Duration::from_secs(5 * 60))
            .await
            .expect("entry should still be live");

        assert!(Arc::ptr_eq(&stored, &later));
    }

    #[tokio::test]
    async fn entry_expires_at_ttl_boundary() {
        let cache = TtlCache::with_ttl(CACHE_DURATION);
        let start = Instant::now();
        cache.insert_at("Oslo", 1_u32, start).await;

        let just_before = start + CACHE_DURATION - Duration::from_millis(1);
        assert!(cache.get_at(&"Oslo", just_before).await.is_some());
        assert!(cache.get_at(&"Oslo", start + CACHE_DURATION).await.is_none());
    }

    #[tokio::test]
    async fn insert_replaces_previous_entry() {
        let cache = TtlCache::with_ttl(CACHE_DURATION);
        let start = Instant::now();
        cache.insert_at("Oslo", 1_u32, start).await;
        cache
            .insert_at("Oslo", 2_u32, start + Duration::from_secs(20 * 60))
            .await;

        let value = cache
            .get_at(&"Oslo", start + Duration::from_secs(21 * 60))
            .await
            .expect("fresh entry");
        assert_eq!(*value, 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = TtlCache::with_ttl(CACHE_DURATION);
        cache.insert("Oslo", 1_u32).await;

        assert!(cache.get(&"Bergen").await.is_none());
        assert_eq!(cache.get(&"Oslo").await.as_deref(), Some(&1));
    }

    #[tokio::test]
    async fn get_or_try_insert_with_fetches_once_within_ttl() {
        let cache = TtlCache::with_ttl(CACHE_DURATION);
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let first = cache
            .get_or_try_insert_with("Trondheim", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(3_u32)
            })
            .await
            .expect("first fetch");
        let second = cache
            .get_or_try_insert_with("Trondheim", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(4_u32)
            })
            .await
            .expect("cached");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache: TtlCache<&str, u32> = TtlCache::with_ttl(CACHE_DURATION);

        let err = cache
            .get_or_try_insert_with("Stavanger", || async { Err("offline") })
            .await;
        assert_eq!(err, Err("offline"));
        assert!(cache.is_empty().await);

        let ok = cache
            .get_or_try_insert_with("Stavanger", || async { Ok::<_, &str>(9) })
            .await;
        assert_eq!(ok.as_deref(), Ok(&9));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let cache = TtlCache::with_ttl(CACHE_DURATION);
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(5_u32)
        };

        let (a, b) = tokio::join!(
            cache.get_or_try_insert_with("Oslo", fetch),
            cache.get_or_try_insert_with("Oslo", fetch),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.expect("a"), &b.expect("b")));
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn gates_are_released_after_parallel_callers_finish() {
        let cache = Arc::new(TtlCache::with_ttl(Duration::from_millis(1)));
        let mut handles = Vec::new();

        for round in 0..64_u32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_insert_with(round % 4, move || async move {
                        tokio::time::sleep(Duration::from_millis(2)).await;
                        Ok::<_, String>(round)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert!(handle.await.expect("join").is_ok());
        }
        assert!(cache.in_flight.lock().await.is_empty());
        assert!(cache.len().await <= 4);
    }
}
