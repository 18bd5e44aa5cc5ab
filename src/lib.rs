pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{EnrichConfig, SearchContextSize, TomlConfig};

pub use adapters::{FileCache, MemoryCache};
pub use crate::core::{cached::CachedEnricher, fetcher::EnrichmentFetcher};
pub use domain::cancel::CancellationSignal;
pub use domain::model::{CacheKey, EnrichmentRecord, ImageRef, PlaygroundDetails};
pub use domain::ports::{Enricher, EnrichmentCache};
pub use utils::error::{EnrichError, Result};
