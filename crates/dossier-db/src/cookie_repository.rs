use dossier_core::error::AppError;
use dossier_core::models::Cookie;
use dossier_core::traits::CookieJar;
use sqlx::{PgPool, Pool, Postgres};

/// Per-account browser cookies in PostgreSQL.
#[derive(Clone)]
pub struct CookieRepository {
    pool: Pool<Postgres>,
}

impl CookieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cookies saved for `identity`; empty when none were ever stored.
    pub async fn load(&self, identity: &str) -> Result<Vec<Cookie>, AppError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT cookies FROM cookie_jar WHERE identity = $1")
                .bind(identity)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        match row {
            Some((cookies,)) => Ok(serde_json::from_value(cookies)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the saved cookies for `identity`.
    pub async fn store(&self, identity: &str, cookies: &[Cookie]) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cookie_jar (identity, cookies, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (identity) DO UPDATE
            SET cookies = EXCLUDED.cookies,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(identity)
        .bind(serde_json::to_value(cookies)?)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        tracing::debug!(%identity, count = cookies.len(), "Stored cookies");
        Ok(())
    }

    pub async fn clear(&self, identity: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cookie_jar WHERE identity = $1")
            .bind(identity)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

impl CookieJar for CookieRepository {
    async fn load(&self, identity: &str) -> Result<Vec<Cookie>, AppError> {
        CookieRepository::load(self, identity).await
    }

    async fn store(&self, identity: &str, cookies: &[Cookie]) -> Result<(), AppError> {
        CookieRepository::store(self, identity, cookies).await
    }
}
