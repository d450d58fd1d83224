use std::collections::HashMap;
use std::convert::Infallible;
use std::error::Error;
use std::future::Future;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Cache in front of a [`SettingsStorage`](crate::SettingsStorage)
///
/// Its keys are produced by [`cache_key`](crate::cache_key).
/// Entries are disposable copies of stored values and may vanish at any time.
pub trait SettingsCache: Send + Sync + 'static {
    /// Error produced by the cache's underlying system
    type Error: Error + Send + Sync + 'static;

    /// Checks whether an entry exists for `key`
    fn has(&self, key: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Retrieves the entry for `key`
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Stores an entry for `key` which expires after `ttl`
    fn put(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Removes the entry for `key`
    fn forget(&self, key: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// [`SettingsCache`] keeping its entries in memory
///
/// Expired entries are dropped lazily when they are accessed.
/// Expiry is measured with tokio's clock.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl MemoryCache {
    /// Constructs an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a live entry, dropping it if it expired
    fn live_entry(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }
}

impl SettingsCache for MemoryCache {
    type Error = Infallible;

    async fn has(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self.live_entry(key).is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        Ok(self.live_entry(key))
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), Self::Error> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), Self::Error> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::time;

    use super::*;

    #[tokio::test]
    async fn put_get_forget() {
        let cache = MemoryCache::new();
        assert!(!cache.has("settings.theme").await.unwrap());

        cache
            .put("settings.theme", json!("dark"), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.has("settings.theme").await.unwrap());
        assert_eq!(
            cache.get("settings.theme").await.unwrap(),
            Some(json!("dark"))
        );

        cache.forget("settings.theme").await.unwrap();
        assert_eq!(cache.get("settings.theme").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let cache = MemoryCache::new();
        cache
            .put("settings.theme", json!("dark"), Duration::from_secs(60))
            .await
            .unwrap();

        time::advance(Duration::from_secs(59)).await;
        assert!(cache.has("settings.theme").await.unwrap());

        time::advance(Duration::from_secs(1)).await;
        assert!(!cache.has("settings.theme").await.unwrap());
        assert_eq!(cache.get("settings.theme").await.unwrap(), None);
    }
}
