//! Freshness-bounded profile cache.
//!
//! A cached record is served only while `updated_at > now - window`.
//! Writes are unconditional upserts; the content hash is used for change
//! logging only.

use chrono::{DateTime, TimeDelta, Utc};
use moka::future::Cache;

use crate::error::AppError;
use crate::models::{CachedProfile, ProfileRecord, compute_hash};
use crate::traits::ProfileStore;

/// Freshness policy on top of any [`ProfileStore`].
#[derive(Clone)]
pub struct ProfileCache<S: ProfileStore> {
    store: S,
    window: TimeDelta,
}

impl<S: ProfileStore> ProfileCache<S> {
    pub fn new(store: S, window: TimeDelta) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// The record cached under `key` if it is younger than the window.
    pub async fn lookup(&self, key: &str) -> Result<Option<ProfileRecord>, AppError> {
        self.lookup_at(key, Utc::now()).await
    }

    pub async fn lookup_at(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ProfileRecord>, AppError> {
        let Some(cached) = self.store.load(key).await? else {
            tracing::debug!(%key, "Cache miss");
            return Ok(None);
        };
        if cached.updated_at > now - self.window {
            tracing::info!(%key, updated_at = %cached.updated_at, "Cache hit");
            Ok(Some(cached.profile))
        } else {
            tracing::info!(%key, updated_at = %cached.updated_at, "Cached profile is stale");
            Ok(None)
        }
    }

    /// The latest snapshot under `key`, regardless of age.
    pub async fn inspect(&self, key: &str) -> Result<Option<CachedProfile>, AppError> {
        self.store.load(key).await
    }

    /// Write `record` under every key. Returns the record's data hash.
    pub async fn store(&self, keys: &[String], record: &ProfileRecord) -> Result<String, AppError> {
        let data_hash = compute_hash(&record.to_json()?);

        if let Some(primary) = keys.first() {
            match self.store.load(primary).await {
                Ok(Some(previous)) if previous.data_hash == data_hash => {
                    tracing::info!(key = %primary, data_hash = %&data_hash[..8], "Profile unchanged, refreshing snapshot");
                }
                Ok(Some(_)) => {
                    tracing::info!(key = %primary, data_hash = %&data_hash[..8], "Profile CHANGED, saving new snapshot");
                }
                Ok(None) => {
                    tracing::info!(key = %primary, data_hash = %&data_hash[..8], "First snapshot for profile");
                }
                Err(e) => {
                    tracing::warn!(key = %primary, error = %e, "Could not read previous snapshot");
                }
            }
        }

        self.store.save(keys, record, &data_hash).await?;
        Ok(data_hash)
    }

    /// Drop the snapshot under `key` together with its copies under the other
    /// keys of the same profile. Returns the number of entries removed.
    pub async fn evict(&self, key: &str) -> Result<u64, AppError> {
        let removed = self.store.remove(key).await?;
        tracing::info!(%key, removed, "Evicted cached profile");
        Ok(removed)
    }
}

/// In-process [`ProfileStore`] backed by a bounded `moka` cache.
#[derive(Clone)]
pub struct MemoryProfileStore {
    entries: Cache<String, CachedProfile>,
}

impl MemoryProfileStore {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_capacity).build(),
        }
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn load(&self, key: &str) -> Result<Option<CachedProfile>, AppError> {
        Ok(self.entries.get(key).await)
    }

    async fn save(
        &self,
        keys: &[String],
        profile: &ProfileRecord,
        data_hash: &str,
    ) -> Result<(), AppError> {
        let snapshot = CachedProfile {
            profile: profile.clone(),
            data_hash: data_hash.to_string(),
            updated_at: Utc::now(),
        };
        for key in keys {
            self.entries.insert(key.clone(), snapshot.clone()).await;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<u64, AppError> {
        let Some(evicted) = self.entries.remove(key).await else {
            return Ok(0);
        };
        let mut removed = 1;

        if let Some(url) = evicted.profile.profile_url {
            let siblings: Vec<_> = self
                .entries
                .iter()
                .filter(|(_, cached)| cached.profile.profile_url.as_deref() == Some(url.as_str()))
                .map(|(sibling, _)| sibling)
                .collect();
            for sibling in siblings {
                if self.entries.remove(sibling.as_str()).await.is_some() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
