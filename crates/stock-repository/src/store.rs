//! Persistent cache store backed by SQLite.
//!
//! One row per (ticker, data type, period type); writes are single-row
//! upserts, no cross-row transactions. Rows are never deleted, only replaced.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use research_core::{CacheKey, CacheStore, CachedPayload, ResearchError};
use sqlx::SqlitePool;

pub struct SqlCacheStore {
    pool: SqlitePool,
}

impl SqlCacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, ResearchError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| ResearchError::Database(e.to_string()))?;
        let store = Self::new(pool);
        store.init_tables().await?;
        Ok(store)
    }

    pub async fn init_tables(&self) -> Result<(), ResearchError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS provider_cache (
                ticker TEXT NOT NULL,
                data_type TEXT NOT NULL,
                period_type TEXT NOT NULL,
                payload TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (ticker, data_type, period_type)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ResearchError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl CacheStore for SqlCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedPayload>, ResearchError> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT payload, fetched_at FROM provider_cache
             WHERE ticker = ? AND data_type = ? AND period_type = ?",
        )
        .bind(&key.ticker)
        .bind(key.data_type.as_str())
        .bind(key.period_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ResearchError::Database(e.to_string()))?;

        match row {
            Some((payload, fetched_at)) => {
                let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
                    .map_err(|e| ResearchError::Cache(format!("bad fetched_at: {}", e)))?
                    .with_timezone(&Utc);
                Ok(Some(CachedPayload {
                    payload,
                    fetched_at,
                }))
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &CacheKey,
        payload: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), ResearchError> {
        sqlx::query(
            "INSERT INTO provider_cache (ticker, data_type, period_type, payload, fetched_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(ticker, data_type, period_type) DO UPDATE SET
                payload = excluded.payload,
                fetched_at = excluded.fetched_at",
        )
        .bind(&key.ticker)
        .bind(key.data_type.as_str())
        .bind(key.period_type.as_str())
        .bind(payload)
        .bind(fetched_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ResearchError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{DataType, PeriodType};

    async fn memory_store() -> SqlCacheStore {
        // one connection, or each pooled connection would see its own :memory: db
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqlCacheStore::new(pool);
        store.init_tables().await.unwrap();
        store
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = memory_store().await;
        let key = CacheKey::new("AAPL", DataType::Statements, PeriodType::Annual);
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_prior_entry() {
        let store = memory_store().await;
        let key = CacheKey::new("AAPL", DataType::Statements, PeriodType::Annual);

        let first = Utc::now() - chrono::Duration::days(10);
        store.put(&key, "old payload", first).await.unwrap();

        let second = Utc::now();
        store.put(&key, "new payload", second).await.unwrap();

        let cached = store.get(&key).await.unwrap().unwrap();
        assert_eq!(cached.payload, "new payload");
        assert!((cached.fetched_at - second).num_seconds().abs() < 2);
    }

    #[tokio::test]
    async fn keys_are_independent_rows() {
        let store = memory_store().await;
        let statements = CacheKey::new("AAPL", DataType::Statements, PeriodType::Annual);
        let quote = CacheKey::new("AAPL", DataType::Quote, PeriodType::Annual);

        store.put(&statements, "s", Utc::now()).await.unwrap();
        store.put(&quote, "q", Utc::now()).await.unwrap();

        assert_eq!(store.get(&statements).await.unwrap().unwrap().payload, "s");
        assert_eq!(store.get(&quote).await.unwrap().unwrap().payload, "q");
    }
}
