//! Key/value blob access over the `local_store` table.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for whole-value JSON blobs.
#[derive(Debug, Clone)]
pub struct BlobRepository {
    pool: SqlitePool,
}

impl BlobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BlobRepository { pool }
    }

    /// Returns the raw text stored at `key`.
    pub async fn get_raw(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM local_store WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Reads and decodes the JSON stored at `key`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DbError::serialization(key, e)),
            None => Ok(None),
        }
    }

    /// Writes `value` at `key`, replacing whatever was there.
    pub async fn put_raw(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO local_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = value.len(), "Blob written");
        Ok(())
    }

    /// Encodes `value` as JSON and writes it at `key`.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| DbError::serialization(key, e))?;
        self.put_raw(key, &raw).await
    }

    /// Deletes `key`. Returns whether a row was removed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM local_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> BlobRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().blobs()
    }

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let blobs = repo().await;
        assert!(blobs.get_raw("hopline:theme").await.unwrap().is_none());

        blobs.put_json("hopline:theme", "light").await.unwrap();
        blobs.put_json("hopline:theme", "dark").await.unwrap();

        let theme: Option<String> = blobs.get_json("hopline:theme").await.unwrap();
        assert_eq!(theme.as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_serialization_error() {
        let blobs = repo().await;
        blobs.put_raw("hopline:users", "{oops").await.unwrap();

        let result: DbResult<Option<Vec<String>>> = blobs.get_json("hopline:users").await;
        assert!(matches!(result, Err(DbError::Serialization { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let blobs = repo().await;
        blobs.put_raw("hopline:trusted:a@x.com", "true").await.unwrap();
        blobs.put_raw("hopline:trusted:b@x.com", "true").await.unwrap();

        assert!(blobs.delete("hopline:trusted:a@x.com").await.unwrap());
        assert!(!blobs.delete("hopline:trusted:a@x.com").await.unwrap());
        assert!(blobs.get_raw("hopline:trusted:b@x.com").await.unwrap().is_some());
    }
}
