use super::{Cached, CachingProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use ddd_domain::error::DomainResult;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    // None 表示永不过期
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// 进程内缓存，按绝对过期时间淘汰
#[derive(Debug, Default)]
pub struct MemoryCachingProvider {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCachingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }
}

#[async_trait]
impl CachingProvider for MemoryCachingProvider {
    async fn get_or_compute<'a>(
        &self,
        key: &str,
        ttl: Duration,
        force_refresh: bool,
        compute: BoxFuture<'a, DomainResult<Value>>,
    ) -> DomainResult<Cached> {
        if force_refresh {
            self.invalidate(key);
        } else if let Some(value) = self.lookup(key) {
            trace!(key, "cache hit");
            return Ok(Cached::hit(value));
        }

        trace!(key, force_refresh, "cache miss");
        let value = compute.await?;
        let entry = CacheEntry {
            value: value.clone(),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(Cached::miss(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddd_domain::error::DomainError;
    use serde_json::json;

    fn value(v: Value) -> BoxFuture<'static, DomainResult<Value>> {
        Box::pin(async move { Ok(v) })
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCachingProvider::new();
        let ttl = Duration::from_secs(10);

        let first = cache.get_or_compute("k", ttl, false, value(json!(1))).await.unwrap();
        assert_eq!(first, Cached::miss(json!(1)));

        let second = cache.get_or_compute("k", ttl, false, value(json!(2))).await.unwrap();
        assert_eq!(second, Cached::hit(json!(1)));

        tokio::time::advance(Duration::from_secs(11)).await;
        let third = cache.get_or_compute("k", ttl, false, value(json!(3))).await.unwrap();
        assert_eq!(third, Cached::miss(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_ttl_never_expires() {
        let cache = MemoryCachingProvider::new();
        cache
            .get_or_compute("k", Duration::MAX, false, value(json!("a")))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        let again = cache
            .get_or_compute("k", Duration::MAX, false, value(json!("b")))
            .await
            .unwrap();
        assert!(again.hit);
        assert_eq!(again.value, json!("a"));
    }

    #[tokio::test]
    async fn forced_refresh_recomputes() {
        let cache = MemoryCachingProvider::new();
        let ttl = Duration::from_secs(60);
        cache.get_or_compute("k", ttl, false, value(json!(1))).await.unwrap();
        let refreshed = cache.get_or_compute("k", ttl, true, value(json!(2))).await.unwrap();
        assert_eq!(refreshed, Cached::miss(json!(2)));
        let cached = cache.get_or_compute("k", ttl, false, value(json!(3))).await.unwrap();
        assert_eq!(cached, Cached::hit(json!(2)));
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached() {
        let cache = MemoryCachingProvider::new();
        let failing: BoxFuture<'static, DomainResult<Value>> =
            Box::pin(async { Err(DomainError::database("offline")) });
        assert!(cache
            .get_or_compute("k", Duration::MAX, false, failing)
            .await
            .is_err());
        assert!(cache.is_empty());
    }
}
