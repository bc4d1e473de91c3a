use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalidation failed: {0}")]
    InvalidationError(String),
}

/// In-process cache for the public catalog lists
///
/// Values are stored as serialized JSON so one cache can hold services,
/// partner offers, banners and ads side by side. Writes drop every entry
/// sharing the written list's key prefix.
#[derive(Clone)]
pub struct CatalogCache {
    entries: moka::future::Cache<String, Vec<u8>>,
}

impl CatalogCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let entries = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .support_invalidation_closures()
            .build();

        Self { entries }
    }

    /// Get a cached value; undecodable entries count as a miss
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let bytes = self.entries.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::trace!("Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Dropping undecodable cache entry {}: {}", key, e);
                self.entries.invalidate(key).await;
                None
            }
        }
    }

    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.entries.insert(key.to_string(), bytes).await;
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Invalidate all entries whose key starts with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let prefix = prefix.to_string();
        self.entries
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
            .map_err(|e| CacheError::InvalidationError(e.to_string()))?;
        tracing::debug!("Invalidated cache prefix");
        Ok(())
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub const SERVICES: &'static str = "services";
    pub const PARTNER_OFFERS: &'static str = "offers:";
    pub const BANNERS: &'static str = "banners:";
    pub const ADS: &'static str = "ads:";

    /// Partner offers for a category, `all` when unfiltered
    pub fn partner_offers(category: Option<&str>) -> String {
        format!("{}{}", Self::PARTNER_OFFERS, category.unwrap_or("all"))
    }

    /// Live banners for a position on a given day
    pub fn banners(position: Option<&str>, day: chrono::NaiveDate) -> String {
        format!("{}{}:{}", Self::BANNERS, position.unwrap_or("any"), day)
    }

    pub fn ads(category: Option<&str>) -> String {
        format!("{}{}", Self::ADS, category.unwrap_or("all"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = CatalogCache::new(100, 60);

        cache.set("services", &vec!["Бухгалтерия".to_string()]).await.unwrap();
        let result: Option<Vec<String>> = cache.get("services").await;
        assert_eq!(result, Some(vec!["Бухгалтерия".to_string()]));

        assert!(cache.get::<Vec<String>>("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_prefix_invalidation_keeps_other_lists() {
        let cache = CatalogCache::new(100, 60);
        cache.set(&CacheKey::partner_offers(None), &1).await.unwrap();
        cache.set(&CacheKey::partner_offers(Some("bank")), &2).await.unwrap();
        cache.set(CacheKey::SERVICES, &3).await.unwrap();

        cache.invalidate_prefix(CacheKey::PARTNER_OFFERS).unwrap();
        cache.entries.run_pending_tasks().await;

        assert!(cache.get::<i32>(&CacheKey::partner_offers(None)).await.is_none());
        assert!(cache.get::<i32>(&CacheKey::partner_offers(Some("bank"))).await.is_none());
        assert_eq!(cache.get::<i32>(CacheKey::SERVICES).await, Some(3));
    }

    #[test]
    fn test_cache_key_builder() {
        let day = chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(CacheKey::partner_offers(None), "offers:all");
        assert_eq!(CacheKey::partner_offers(Some("crm")), "offers:crm");
        assert_eq!(CacheKey::banners(Some("top"), day), "banners:top:2026-10-16");
        assert_eq!(CacheKey::ads(None), "ads:all");
    }
}
