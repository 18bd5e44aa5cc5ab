use crate::domain::model::{CacheKey, EnrichmentRecord};
use crate::domain::ports::EnrichmentCache;
use crate::utils::error::{EnrichError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-process cache. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<CacheKey, EnrichmentRecord>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl EnrichmentCache for MemoryCache {
    async fn fetch(&self, key: &CacheKey) -> Result<Option<EnrichmentRecord>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &CacheKey, record: &EnrichmentRecord) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.clone(), record.clone());
        Ok(())
    }
}

/// On-disk layout of one cached record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub address: CacheKey,
    pub cached_at: DateTime<Utc>,
    pub record: EnrichmentRecord,
}

/// One JSON file per address under `base_path`. Entries never expire.
#[derive(Debug, Clone)]
pub struct FileCache {
    base_path: PathBuf,
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FileCache {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.base_path
            .join(format!("{}-{}.json", slug(key.as_str()), key_digest(key.as_str())))
    }

    /// Read the full entry, including when it was written.
    pub async fn fetch_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EnrichError::CacheError {
                    message: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        let entry: CacheEntry =
            serde_json::from_slice(&data).map_err(|e| EnrichError::CacheError {
                message: format!("corrupt cache entry {}: {}", path.display(), e),
            })?;

        // 檔名雜湊碰撞時視為未命中
        if &entry.address != key {
            tracing::warn!(
                "⚠️ Cache file {} belongs to '{}', not '{}'",
                path.display(),
                entry.address,
                key
            );
            return Ok(None);
        }

        Ok(Some(entry))
    }
}

#[async_trait]
impl EnrichmentCache for FileCache {
    async fn fetch(&self, key: &CacheKey) -> Result<Option<EnrichmentRecord>> {
        Ok(self.fetch_entry(key).await?.map(|entry| entry.record))
    }

    async fn save(&self, key: &CacheKey, record: &EnrichmentRecord) -> Result<()> {
        let path = self.entry_path(key);
        let entry = CacheEntry {
            address: key.clone(),
            cached_at: Utc::now(),
            record: record.clone(),
        };
        let data = serde_json::to_vec_pretty(&entry)?;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| EnrichError::CacheError {
                message: format!("failed to create {}: {}", self.base_path.display(), e),
            })?;

        // 先寫暫存檔再 rename，避免讀到寫一半的檔案
        let tmp_path = path.with_extension(format!(
            "{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&tmp_path, &data)
            .await
            .map_err(|e| EnrichError::CacheError {
                message: format!("failed to write {}: {}", tmp_path.display(), e),
            })?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(EnrichError::CacheError {
                message: format!("failed to replace {}: {}", path.display(), e),
            });
        }

        tracing::debug!("💾 Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

fn slug(value: &str) -> String {
    let mut slug = String::new();
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
        if slug.len() >= 48 {
            break;
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "address".to_string()
    } else {
        trimmed.to_string()
    }
}

/// First 16 hex chars of the key's SHA-256 digest.
fn key_digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
