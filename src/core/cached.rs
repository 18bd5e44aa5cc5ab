use crate::domain::cancel::{is_cancelled, CancellationSignal};
use crate::domain::model::{CacheKey, EnrichmentRecord};
use crate::domain::ports::{Enricher, EnrichmentCache};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Serves records from an [`EnrichmentCache`] and falls back to the wrapped
/// [`Enricher`] on a miss, storing what it returns.
///
/// Concurrent misses for the same address are not coalesced: each one calls
/// the inner enricher and the last write wins.
pub struct CachedEnricher<E, C> {
    inner: E,
    cache: C,
}

impl<E, C> CachedEnricher<E, C> {
    pub fn new(inner: E, cache: C) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }
}

impl<E: Enricher, C: EnrichmentCache> CachedEnricher<E, C> {

    pub async fn get_or_fetch(
        &self,
        address: &str,
        name: Option<&str>,
        cancel: Option<&CancellationSignal>,
    ) -> Result<Option<EnrichmentRecord>> {
        if is_cancelled(cancel) {
            return Ok(None);
        }

        let key = CacheKey::from_address(address);

        // 快取命中直接回傳，不檢查新鮮度
        if let Some(record) = self.cache.fetch(&key).await? {
            tracing::debug!("💾 Cache hit for '{}'", key);
            return Ok(Some(record));
        }

        tracing::debug!("💾 Cache miss for '{}'", key);
        let fetched = self.inner.enrich(address, name, cancel).await?;

        let record = match fetched {
            Some(record) if !is_cancelled(cancel) => record,
            _ => {
                tracing::debug!("⏹️ Nothing to cache for '{}'", key);
                return Ok(None);
            }
        };

        self.cache.save(&key, &record).await?;
        tracing::debug!("💾 Cached enrichment for '{}'", key);

        Ok(Some(record))
    }
}

#[async_trait]
impl<E: Enricher, C: EnrichmentCache> Enricher for CachedEnricher<E, C> {
    async fn enrich(
        &self,
        address: &str,
        name: Option<&str>,
        cancel: Option<&CancellationSignal>,
    ) -> Result<Option<EnrichmentRecord>> {
        self.get_or_fetch(address, name, cancel).await
    }
}
