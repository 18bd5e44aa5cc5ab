pub mod cached;
pub mod extract;
pub mod fetcher;
pub mod prompt;

pub use crate::domain::cancel::CancellationSignal;
pub use crate::domain::model::{CacheKey, EnrichmentRecord, ImageRef, PlaygroundDetails};
pub use crate::domain::ports::{Enricher, EnrichmentCache};
pub use crate::utils::error::Result;
