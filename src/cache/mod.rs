//! Content-addressed, TTL'd, single-flight response cache.
//!
//! Cache keys (fingerprints) are derived from a URL plus the subset of
//! per-request options that affect the rendered result (see
//! [`fingerprint`]). Entries are stored as a gzip-compressed JSON payload
//! file plus a sidecar metadata file, following the same atomic
//! temp-file-then-rename pattern as `content_saver::compression`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::OnceCell;

/// Stable fingerprint identifying one `(url, option subset)` cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subset of scrape options that change what gets cached; anything not
/// listed here (e.g. `skipCache`, `webhook`) does not participate in the
/// fingerprint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FingerprintInputs {
    pub url: String,
    pub use_browser: bool,
    pub only_main_content: bool,
    pub extractor_format: Option<String>,
    pub wait_for_selector: Option<String>,
}

/// Computes a stable fingerprint by canonicalizing the JSON form (recursive
/// key sort) before hashing, so field-declaration order never changes the
/// resulting key.
pub fn fingerprint(inputs: &FingerprintInputs) -> Fingerprint {
    let value = serde_json::to_value(inputs).unwrap_or(serde_json::Value::Null);
    let sorted = sort_keys(value);
    let canonical = serde_json::to_string(&sorted).unwrap_or_default();
    let hash = xxhash_rust::xxh3::xxh3_64(canonical.as_bytes());
    Fingerprint(format!("{hash:016x}"))
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(entries.into_iter().collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

/// A cached result plus its cache bookkeeping. Generic over the payload type
/// so the same store backs both the page-extraction cache (C3/C4) and any
/// other content-addressable artifact callers want to cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub content_type: String,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

type BuildResult<T> = Result<CacheEntry<T>, Arc<anyhow::Error>>;

/// File-backed cache with an in-memory single-flight layer in front of it.
pub struct ResponseCache<T> {
    directory: PathBuf,
    default_ttl: chrono::Duration,
    inflight: DashMap<Fingerprint, Arc<OnceCell<BuildResult<T>>>>,
    /// Reverse index from source URL to every fingerprint built for it, so
    /// `invalidate(url)` can find every key without scanning the directory.
    /// In-process only, consistent with the single-controller-process store
    /// this crate ships (see `job_store`'s own note on the same assumption).
    url_index: DashMap<String, Vec<Fingerprint>>,
}

impl<T> ResponseCache<T>
where
    T: Serialize + serde::de::DeserializeOwned + Clone + Send + 'static,
{
    pub fn new(directory: PathBuf, default_ttl_secs: i64) -> Self {
        Self {
            directory,
            default_ttl: chrono::Duration::seconds(default_ttl_secs),
            inflight: DashMap::new(),
            url_index: DashMap::new(),
        }
    }

    fn entry_path(&self, key: &Fingerprint) -> PathBuf {
        self.directory.join(format!("{key}.json.gz"))
    }

    /// Returns a cached, unexpired entry if present, without triggering a
    /// rebuild.
    pub async fn get(&self, key: &Fingerprint) -> Option<CacheEntry<T>> {
        let path = self.entry_path(key);
        match read_entry::<T>(&path).await {
            Ok(entry) if !entry.is_expired() => Some(entry),
            _ => None,
        }
    }

    /// Returns the cached entry for `key` if present and fresh; otherwise
    /// runs `build` exactly once even under concurrent callers for the same
    /// key (single-flight), stores the result, and returns it. `url` is
    /// recorded against `key` so [`Self::invalidate`] can find it later.
    pub async fn get_or_build<F, Fut>(
        &self,
        key: Fingerprint,
        url: &str,
        build: F,
    ) -> Result<CacheEntry<T>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(T, String)>>,
    {
        if let Some(entry) = self.get(&key).await {
            return Ok(entry);
        }

        let cell = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let ttl = self.default_ttl;
        let path = self.entry_path(&key);
        let result = cell
            .get_or_init(|| async move {
                let (data, content_type) = build().await.map_err(Arc::new)?;
                let now = Utc::now();
                let entry = CacheEntry {
                    data,
                    created_at: now,
                    expires_at: now + ttl,
                    content_type,
                };
                if let Err(e) = write_entry(&path, &entry).await {
                    log::warn!("cache write failed for {path:?}: {e}");
                }
                Ok(entry)
            })
            .await
            .clone();

        self.inflight.remove(&key);

        if result.is_ok() {
            self.url_index
                .entry(url.to_string())
                .or_default()
                .push(key.clone());
        }

        result.map_err(|e| anyhow::anyhow!("cache build failed: {e}"))
    }

    /// Removes every cache entry recorded for `url`. Idempotent: invalidating
    /// a URL with nothing cached is a no-op. After this returns, `get` for
    /// any key that was built for `url` misses.
    pub async fn invalidate(&self, url: &str) -> usize {
        let Some((_, keys)) = self.url_index.remove(url) else {
            return 0;
        };
        let mut removed = 0;
        for key in &keys {
            self.inflight.remove(key);
            let path = self.entry_path(key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("cache invalidate failed to remove {path:?}: {e}"),
            }
        }
        removed
    }

    /// Empties the entire cache: every on-disk entry, the URL index, and any
    /// in-flight single-flight cells. Idempotent on an already-empty cache.
    pub async fn clear(&self) {
        self.inflight.clear();
        self.url_index.clear();
        match tokio::fs::read_dir(&self.directory).await {
            Ok(mut entries) => {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    if entry.path().extension().is_some_and(|ext| ext == "gz") {
                        let _ = tokio::fs::remove_file(entry.path()).await;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("cache clear failed to read {:?}: {e}", self.directory),
        }
    }
}

async fn read_entry<T>(path: &Path) -> Result<CacheEntry<T>>
where
    T: serde::de::DeserializeOwned + Send + 'static,
{
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<CacheEntry<T>> {
        let file = std::fs::File::open(&path).context("open cache file")?;
        let mut decoder = GzDecoder::new(file);
        let mut json = String::new();
        decoder.read_to_string(&mut json).context("decompress cache file")?;
        let entry: CacheEntry<T> = serde_json::from_str(&json).context("parse cache entry")?;
        Ok(entry)
    })
    .await
    .context("cache read task panicked")?
}

async fn write_entry<T>(path: &Path, entry: &CacheEntry<T>) -> Result<()>
where
    T: Serialize + Clone + Send + 'static,
{
    let path = path.to_path_buf();
    let entry = entry.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("cache path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let json = serde_json::to_vec(&entry)?;
        let temp_file = NamedTempFile::new_in(parent)?;
        let mut encoder = GzEncoder::new(temp_file, Compression::new(3));
        encoder.write_all(&json)?;
        let temp_file = encoder.finish()?;
        temp_file.persist(&path)?;
        Ok(())
    })
    .await
    .context("cache write task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_ignores_field_order_sensitivity() {
        let a = fingerprint(&FingerprintInputs {
            url: "https://example.com".into(),
            use_browser: true,
            only_main_content: false,
            extractor_format: Some("markdown".into()),
            wait_for_selector: None,
        });
        let b = fingerprint(&FingerprintInputs {
            url: "https://example.com".into(),
            use_browser: true,
            only_main_content: false,
            extractor_format: Some("markdown".into()),
            wait_for_selector: None,
        });
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_on_option_change() {
        let base = FingerprintInputs {
            url: "https://example.com".into(),
            use_browser: false,
            only_main_content: true,
            extractor_format: None,
            wait_for_selector: None,
        };
        let mut changed = base.clone_for_test();
        changed.use_browser = true;
        assert_ne!(fingerprint(&base), fingerprint(&changed));
    }

    impl FingerprintInputs {
        fn clone_for_test(&self) -> Self {
            Self {
                url: self.url.clone(),
                use_browser: self.use_browser,
                only_main_content: self.only_main_content,
                extractor_format: self.extractor_format.clone(),
                wait_for_selector: self.wait_for_selector.clone(),
            }
        }
    }

    #[tokio::test]
    async fn single_flight_builds_once_under_concurrency() {
        let dir = tempfile::tempdir().unwrap();
        let cache: Arc<ResponseCache<String>> =
            Arc::new(ResponseCache::new(dir.path().to_path_buf(), 3600));
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let key = Fingerprint("test-key".to_string());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_build(key, "https://example.com/single-flight", || async {
                        calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(("<p>hello</p>".to_string(), "text/html".to_string()))
                    })
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_evicts_cached_entry_for_url() {
        let dir = tempfile::tempdir().unwrap();
        let cache: ResponseCache<String> = ResponseCache::new(dir.path().to_path_buf(), 3600);
        let key = Fingerprint("invalidate-key".to_string());
        let url = "https://example.com/page";

        cache
            .get_or_build(key.clone(), url, || async {
                Ok(("body".to_string(), "text/markdown".to_string()))
            })
            .await
            .unwrap();
        assert!(cache.get(&key).await.is_some());

        let removed = cache.invalidate(url).await;
        assert_eq!(removed, 1);
        assert!(cache.get(&key).await.is_none());

        // Idempotent: invalidating again finds nothing left to remove.
        assert_eq!(cache.invalidate(url).await, 0);
    }

    #[tokio::test]
    async fn clear_empties_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache: ResponseCache<String> = ResponseCache::new(dir.path().to_path_buf(), 3600);
        let key_a = Fingerprint("clear-a".to_string());
        let key_b = Fingerprint("clear-b".to_string());

        cache
            .get_or_build(key_a.clone(), "https://example.com/a", || async {
                Ok(("a".to_string(), "text/markdown".to_string()))
            })
            .await
            .unwrap();
        cache
            .get_or_build(key_b.clone(), "https://example.com/b", || async {
                Ok(("b".to_string(), "text/markdown".to_string()))
            })
            .await
            .unwrap();

        cache.clear().await;

        assert!(cache.get(&key_a).await.is_none());
        assert!(cache.get(&key_b).await.is_none());

        // Idempotent on an already-empty cache.
        cache.clear().await;
    }
}
