use crate::crypto::Crypto;
use crate::error::{Result, WellnessError};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    stored_at: DateTime<Utc>,
    sealed: String,
}

/// A value read back from the local cache. Nothing vouches for its
/// freshness; callers decide with `is_stale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    pub fn is_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.stored_at > max_age
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// File-backed key-value cache. Every value is JSON sealed with the app
/// key; the whole file is rewritten on each change.
pub struct LocalCache {
    path: PathBuf,
    crypto: Arc<Crypto>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl LocalCache {
    pub async fn open(path: impl Into<PathBuf>, crypto: Arc<Crypto>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Local cache at {} is unreadable, starting empty: {}", path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(WellnessError::Persistence(format!(
                    "open local cache {}: {e}",
                    path.display()
                )))
            }
        };
        tracing::info!("Local cache opened at {} ({} entries)", path.display(), entries.len());

        Ok(Self {
            path,
            crypto,
            entries: Mutex::new(entries),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<Cached<T>> {
        let entry = self.entries.lock().await.get(key).cloned()?;
        match self.crypto.open_json::<T>(&entry.sealed) {
            Ok(value) => Some(Cached {
                value,
                stored_at: entry.stored_at,
            }),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_at(key, value, Utc::now()).await
    }

    pub async fn set_at<T: Serialize>(&self, key: &str, value: &T, stored_at: DateTime<Utc>) -> Result<()> {
        let sealed = self
            .crypto
            .seal_json(value)
            .map_err(|e| WellnessError::Persistence(format!("seal cache entry {key}: {e}")))?;

        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), Entry { stored_at, sealed });
        self.persist(&entries).await
    }

    /// Read-modify-write of one entry under the cache lock, so concurrent
    /// updates to the same key are not lost. A missing or unreadable entry
    /// starts from `T::default()`.
    pub async fn update<T, F>(&self, key: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T),
    {
        let mut entries = self.entries.lock().await;
        let mut value = match entries.get(key) {
            Some(entry) => self.crypto.open_json::<T>(&entry.sealed).unwrap_or_else(|e| {
                tracing::warn!("Replacing unreadable cache entry {}: {}", key, e);
                T::default()
            }),
            None => T::default(),
        };
        f(&mut value);

        let sealed = self
            .crypto
            .seal_json(&value)
            .map_err(|e| WellnessError::Persistence(format!("seal cache entry {key}: {e}")))?;
        entries.insert(
            key.to_string(),
            Entry {
                stored_at: Utc::now(),
                sealed,
            },
        );
        self.persist(&entries).await?;
        Ok(value)
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    /// True when the date marker under `key` is absent or not `today`.
    pub async fn first_open_today(&self, key: &str, today: NaiveDate) -> bool {
        self.get::<NaiveDate>(key)
            .await
            .map_or(true, |marker| marker.value != today)
    }

    pub async fn stamp_today(&self, key: &str, today: NaiveDate) -> Result<()> {
        self.set(key, &today).await
    }

    async fn persist(&self, entries: &HashMap<String, Entry>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| WellnessError::Persistence(format!("encode local cache: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| WellnessError::Persistence(format!("write local cache: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| WellnessError::Persistence(format!("replace local cache: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn crypto() -> Arc<Crypto> {
        Arc::new(Crypto::from_key_bytes(&[9u8; 32]).unwrap())
    }

    async fn cache(dir: &TempDir) -> LocalCache {
        LocalCache::open(dir.path().join("cache.json"), crypto()).await.unwrap()
    }

    #[tokio::test]
    async fn values_survive_reopen_and_are_sealed_on_disk() {
        let dir = TempDir::new().unwrap();
        let c = cache(&dir).await;
        c.set("plan:u1", &vec!["Nature Walk".to_string()]).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("cache.json")).unwrap();
        assert!(!raw.contains("Nature Walk"));

        let reopened = cache(&dir).await;
        let cached = reopened.get::<Vec<String>>("plan:u1").await.unwrap();
        assert_eq!(cached.value, vec!["Nature Walk".to_string()]);
    }

    #[tokio::test]
    async fn staleness_is_explicit() {
        let dir = TempDir::new().unwrap();
        let c = cache(&dir).await;
        let t0 = Utc::now() - Duration::hours(3);
        c.set_at("k", &1u32, t0).await.unwrap();

        let cached = c.get::<u32>("k").await.unwrap();
        assert!(cached.is_stale(Duration::hours(1), Utc::now()));
        assert!(!cached.is_stale(Duration::hours(4), Utc::now()));
    }

    #[tokio::test]
    async fn wrong_type_or_key_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let c = cache(&dir).await;
        c.set("k", &"text").await.unwrap();
        assert!(c.get::<u32>("k").await.is_none());
        assert!(c.get::<String>("missing").await.is_none());

        let other = LocalCache::open(
            dir.path().join("cache.json"),
            Arc::new(Crypto::from_key_bytes(&[1u8; 32]).unwrap()),
        )
        .await
        .unwrap();
        assert!(other.get::<String>("k").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let c = Arc::new(cache(&dir).await);
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let c = c.clone();
                tokio::spawn(async move { c.update::<Vec<u32>, _>("tally", |v| v.push(i)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut seen = c.get::<Vec<u32>>("tally").await.unwrap().into_inner();
        seen.sort();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn garbage_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cache.json"), b"{not json").unwrap();
        let c = cache(&dir).await;
        assert!(c.get::<String>("anything").await.is_none());
    }

    #[tokio::test]
    async fn first_open_gating() {
        let dir = TempDir::new().unwrap();
        let c = cache(&dir).await;
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let tomorrow = today.succ_opt().unwrap();

        assert!(c.first_open_today("lastStoredDate:u1", today).await);
        c.stamp_today("lastStoredDate:u1", today).await.unwrap();
        assert!(!c.first_open_today("lastStoredDate:u1", today).await);
        assert!(c.first_open_today("lastStoredDate:u1", tomorrow).await);
        assert!(c.first_open_today("lastStoredDate:u2", today).await);
    }
}
