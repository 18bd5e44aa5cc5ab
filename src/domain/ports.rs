use crate::domain::cancel::CancellationSignal;
use crate::domain::model::{CacheKey, EnrichmentRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Persistent store for enrichment results, keyed by normalized address.
#[async_trait]
pub trait EnrichmentCache: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> Result<Option<EnrichmentRecord>>;
    async fn save(&self, key: &CacheKey, record: &EnrichmentRecord) -> Result<()>;
}

/// Produces an enrichment record for an address.
///
/// `Ok(None)` means the caller cancelled; a "not found" answer is a record
/// with all four primary fields absent.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        address: &str,
        name: Option<&str>,
        cancel: Option<&CancellationSignal>,
    ) -> Result<Option<EnrichmentRecord>>;
}
