//! Time-bounded embedding cache scoped to one client instance

use super::client::{EmbeddingClient, EmbeddingError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Default lifetime of a cached vector
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    vector: Vec<f32>,
    stored_at: Instant,
}

/// Wraps an [`EmbeddingClient`] with a text-hash → vector cache.
///
/// Entries expire `ttl` after they were stored. Failed calls are never
/// cached. The cache lives and dies with this instance.
pub struct CachedEmbeddingClient<C> {
    inner: C,
    entries: DashMap<u64, CacheEntry>,
    ttl: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<C: EmbeddingClient> CachedEmbeddingClient<C> {
    pub fn new(inner: C) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: C, ttl: Duration) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn lookup(&self, key: u64) -> Option<Vec<f32>> {
        let fresh = self
            .entries
            .get(&key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.vector.clone());
        if fresh.is_none() {
            self.entries.remove(&key);
        }
        fresh
    }
}

#[async_trait]
impl<C: EmbeddingClient> EmbeddingClient for CachedEmbeddingClient<C> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = text_key(text);
        if let Some(vector) = self.lookup(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(vector);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let vector = self.inner.generate_embedding(text).await?;
        self.entries.insert(
            key,
            CacheEntry {
                vector: vector.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(vector)
    }
}

/// Cache key for a text
fn text_key(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shared call counter for verifying cache behavior.
    #[derive(Clone, Default)]
    struct CallCounter(Arc<AtomicUsize>);

    impl CallCounter {
        fn get(&self) -> usize {
            self.0.load(Ordering::Relaxed)
        }
        fn increment(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct CountingClient {
        calls: CallCounter,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EmbeddingClient for CountingClient {
        fn model_name(&self) -> &str {
            "counting"
        }

        async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.increment();
            if self.fail_on == Some(text) {
                return Err(EmbeddingError::ModelError("rejected".into()));
            }
            Ok(vec![text.len() as f32, 0.5])
        }
    }

    fn cached(ttl: Duration) -> (CachedEmbeddingClient<CountingClient>, CallCounter) {
        let calls = CallCounter::default();
        let client = CountingClient {
            calls: calls.clone(),
            fail_on: Some("bad"),
        };
        (CachedEmbeddingClient::with_ttl(client, ttl), calls)
    }

    #[tokio::test]
    async fn repeated_text_hits_cache() {
        let (client, calls) = cached(DEFAULT_CACHE_TTL);

        let first = client.generate_embedding("hello").await.unwrap();
        let second = client.generate_embedding("hello").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(client.hits(), 1);
        assert_eq!(client.misses(), 1);
        assert_eq!(client.len(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let (client, calls) = cached(Duration::ZERO);

        client.generate_embedding("hello").await.unwrap();
        client.generate_embedding("hello").await.unwrap();

        assert_eq!(calls.get(), 2, "zero ttl never serves from cache");
        assert_eq!(client.hits(), 0);
    }

    #[tokio::test]
    async fn purge_removes_expired_entries() {
        let (client, _) = cached(Duration::ZERO);
        client.generate_embedding("a").await.unwrap();
        client.generate_embedding("b").await.unwrap();

        assert_eq!(client.purge_expired(), 2);
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (client, calls) = cached(DEFAULT_CACHE_TTL);

        assert!(client.generate_embedding("bad").await.is_err());
        assert!(client.generate_embedding("bad").await.is_err());

        assert_eq!(calls.get(), 2);
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn caches_are_scoped_to_instances() {
        let (first, first_calls) = cached(DEFAULT_CACHE_TTL);
        let (second, second_calls) = cached(DEFAULT_CACHE_TTL);

        first.generate_embedding("shared").await.unwrap();
        second.generate_embedding("shared").await.unwrap();

        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 1);
    }

    #[test]
    fn model_name_passes_through() {
        let (client, _) = cached(DEFAULT_CACHE_TTL);
        assert_eq!(client.model_name(), "counting");
    }
}
