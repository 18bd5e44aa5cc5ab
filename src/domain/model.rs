use serde::{Deserialize, Serialize};
use std::fmt;

/// The four fields the model is asked to fill in for a playground.
///
/// All four present, or all four `null` when the model could not find the
/// playground with confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub parking: Option<String>,
}

impl PlaygroundDetails {
    fn present_count(&self) -> usize {
        [
            self.name.is_some(),
            self.description.is_some(),
            self.features.is_some(),
            self.parking.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// Image reference as returned by the search API.
///
/// Older API versions return bare URLs, newer ones return objects. Object
/// keys other than `image_url` are kept as-is so a cached record round-trips
/// without losing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Detailed {
        image_url: String,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    },
    Other(serde_json::Value),
}

impl ImageRef {
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageRef::Url(url) => Some(url.as_str()),
            ImageRef::Detailed { image_url, .. } => Some(image_url.as_str()),
            ImageRef::Other(_) => None,
        }
    }

    /// Page the image was found on, when the API reported one.
    pub fn origin_url(&self) -> Option<&str> {
        match self {
            ImageRef::Detailed { extra, .. } => extra.get("origin_url").and_then(|v| v.as_str()),
            _ => None,
        }
    }
}

/// Structured playground description derived from an AI search answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub parking: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl EnrichmentRecord {
    pub fn from_details(
        details: PlaygroundDetails,
        sources: Vec<String>,
        images: Vec<ImageRef>,
    ) -> Self {
        Self {
            name: details.name,
            description: details.description,
            features: details.features,
            parking: details.parking,
            sources,
            images,
        }
    }

    pub fn details(&self) -> PlaygroundDetails {
        PlaygroundDetails {
            name: self.name.clone(),
            description: self.description.clone(),
            features: self.features.clone(),
            parking: self.parking.clone(),
        }
    }

    /// All four primary fields explicitly absent.
    pub fn is_not_found(&self) -> bool {
        self.details().present_count() == 0
    }

    pub fn is_partial(&self) -> bool {
        let count = self.details().present_count();
        count > 0 && count < 4
    }
}

/// Normalized address used to index cached records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_address(address: &str) -> Self {
        let normalized = address
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
