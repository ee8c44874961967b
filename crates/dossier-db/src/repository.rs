use chrono::{DateTime, Utc};
use dossier_core::error::AppError;
use dossier_core::models::{CachedProfile, ProfileRecord};
use dossier_core::traits::ProfileStore;
use sqlx::{PgPool, Pool, Postgres};

/// Profile snapshots in PostgreSQL, one row per cache key.
///
/// Writes are last-write-wins upserts; `updated_at` is set by the database.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: Pool<Postgres>,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn load(&self, key: &str) -> Result<Option<CachedProfile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile, data_hash, updated_at
            FROM profile_cache
            WHERE cache_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        row.map(CachedProfile::try_from).transpose()
    }

    /// Upsert `profile` under every key in one transaction.
    pub async fn save(
        &self,
        keys: &[String],
        profile: &ProfileRecord,
        data_hash: &str,
    ) -> Result<(), AppError> {
        let json = serde_json::to_value(profile)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        for key in keys {
            sqlx::query(
                r#"
                INSERT INTO profile_cache (cache_key, profile, data_hash, updated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (cache_key) DO UPDATE
                SET profile = EXCLUDED.profile,
                    data_hash = EXCLUDED.data_hash,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(key)
            .bind(&json)
            .bind(data_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        tracing::debug!(keys = keys.len(), "Upserted profile snapshot");
        Ok(())
    }

    /// Delete the snapshot under `key` and every row holding the same profile URL.
    pub async fn remove(&self, key: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM profile_cache
            WHERE cache_key = $1
               OR profile->>'profile_url' = (
                   SELECT profile->>'profile_url' FROM profile_cache WHERE cache_key = $1
               )
            "#,
        )
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Delete every snapshot last written before `cutoff`.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM profile_cache WHERE updated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct ProfileRow {
    profile: serde_json::Value,
    data_hash: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for CachedProfile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, AppError> {
        Ok(CachedProfile {
            profile: serde_json::from_value(row.profile)?,
            data_hash: row.data_hash,
            updated_at: row.updated_at,
        })
    }
}

// -- Trait implementation --

impl ProfileStore for ProfileRepository {
    async fn load(&self, key: &str) -> Result<Option<CachedProfile>, AppError> {
        ProfileRepository::load(self, key).await
    }

    async fn save(
        &self,
        keys: &[String],
        profile: &ProfileRecord,
        data_hash: &str,
    ) -> Result<(), AppError> {
        ProfileRepository::save(self, keys, profile, data_hash).await
    }

    async fn remove(&self, key: &str) -> Result<u64, AppError> {
        ProfileRepository::remove(self, key).await
    }
}
