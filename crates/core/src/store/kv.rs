//! Key/value operations on the device store.
//!
//! Values are JSON documents; `expires_at` is optional and stored as Unix
//! milliseconds so expiry comparisons stay numeric.

use super::connection::StoreDb;
use crate::Error;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

/// A stored value together with its optional expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: Value,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    /// Expired once `now` reaches `expires_at`. Values without expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}

impl StoreDb {
    /// Get a value by key, expired or not.
    pub async fn get_value(&self, key: &str) -> Result<Option<StoredValue>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredValue>, Error> {
                let row = conn
                    .query_row(
                        "SELECT value_json, expires_at FROM kv_store WHERE key = ?1",
                        params![key],
                        |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?)),
                    )
                    .optional()?;

                let Some((json, expires_ms)) = row else {
                    return Ok(None);
                };
                let value = serde_json::from_str(&json)?;
                let expires_at = expires_ms.and_then(DateTime::<Utc>::from_timestamp_millis);
                Ok(Some(StoredValue { value, expires_at }))
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a value.
    pub async fn put_value(&self, key: &str, value: &Value, expires_at: Option<DateTime<Utc>>) -> Result<(), Error> {
        let key = key.to_string();
        let json = serde_json::to_string(value)?;
        let expires_ms = expires_at.map(|t| t.timestamp_millis());
        let updated_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_store (key, value_json, expires_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        expires_at = excluded.expires_at,
                        updated_at = excluded.updated_at",
                    params![key, json, expires_ms, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a value. Returns whether a row was removed.
    pub async fn delete_value(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored keys starting with `prefix`, expired ones included.
    pub async fn count_values(&self, prefix: &str) -> Result<u64, Error> {
        let prefix = prefix.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM kv_store WHERE substr(key, 1, length(?1)) = ?1",
                    params![prefix],
                    |row| row.get(0),
                )?;
                Ok(u64::try_from(count).unwrap_or_default())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every value whose expiry has passed.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_values(&self) -> Result<u64, Error> {
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM kv_store WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_and_get_value() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put_value("user_id", &json!("user_1"), None).await.unwrap();

        let stored = db.get_value("user_id").await.unwrap().unwrap();
        assert_eq!(stored.value, json!("user_1"));
        assert!(stored.expires_at.is_none());
        assert!(!stored.is_expired_at(Utc::now()));
    }

    #[tokio::test]
    async fn test_count_values_by_prefix() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put_value("cache:a", &json!(1), None).await.unwrap();
        db.put_value("cache:b", &json!(2), None).await.unwrap();
        db.put_value("user_id", &json!("u"), None).await.unwrap();

        assert_eq!(db.count_values("cache:").await.unwrap(), 2);
        assert_eq!(db.count_values("").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_get_missing_value() {
        let db = StoreDb::open_in_memory().await.unwrap();
        assert!(db.get_value("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_value() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put_value("k", &json!({"old": 1}), None).await.unwrap();
        db.put_value("k", &json!({"new": 2}), None).await.unwrap();

        let stored = db.get_value("k").await.unwrap().unwrap();
        assert_eq!(stored.value, json!({"new": 2}));
    }

    #[tokio::test]
    async fn test_expiry_roundtrips_at_millisecond_precision() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let expires = Utc::now() + TimeDelta::minutes(5);
        db.put_value("k", &json!([1, 2]), Some(expires)).await.unwrap();

        let stored = db.get_value("k").await.unwrap().unwrap();
        let stored_at = stored.expires_at.unwrap();
        assert_eq!(stored_at.timestamp_millis(), expires.timestamp_millis());
        assert!(!stored.is_expired_at(Utc::now()));
        assert!(stored.is_expired_at(stored_at));
    }

    #[tokio::test]
    async fn test_delete_value() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put_value("k", &json!(true), None).await.unwrap();

        assert!(db.delete_value("k").await.unwrap());
        assert!(!db.delete_value("k").await.unwrap());
        assert!(db.get_value("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_values() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let past = Utc::now() - TimeDelta::seconds(1);
        let future = Utc::now() + TimeDelta::hours(1);
        db.put_value("expired", &json!(1), Some(past)).await.unwrap();
        db.put_value("fresh", &json!(2), Some(future)).await.unwrap();
        db.put_value("forever", &json!(3), None).await.unwrap();

        assert_eq!(db.purge_expired_values().await.unwrap(), 1);
        assert!(db.get_value("expired").await.unwrap().is_none());
        assert!(db.get_value("fresh").await.unwrap().is_some());
        assert!(db.get_value("forever").await.unwrap().is_some());
    }
}
