//! Document collections.
//!
//! [`DocumentStore`] is the seam the server's trip repository is written
//! against; [`StoreDb`] implements it over the `documents` table.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::connection::StoreDb;
use crate::Error;

/// JSON documents grouped into named collections and addressed by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, Error>;

    /// Insert or replace.
    async fn put(&self, collection: &str, id: &str, body: &Value) -> Result<(), Error>;

    /// Insert only if `id` is absent. Returns whether the document was written.
    async fn create(&self, collection: &str, id: &str, body: &Value) -> Result<bool, Error>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, Error>;

    /// Every document in `collection` whose id starts with `id_prefix`, in id order.
    async fn list(&self, collection: &str, id_prefix: &str) -> Result<Vec<(String, Value)>, Error>;
}

#[async_trait]
impl DocumentStore for StoreDb {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, Error> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.conn
            .call(move |conn| -> Result<Option<Value>, Error> {
                let json: Option<String> = conn
                    .query_row(
                        "SELECT body_json FROM documents WHERE collection = ?1 AND id = ?2",
                        params![collection, id],
                        |row| row.get(0),
                    )
                    .optional()?;
                json.map(|j| serde_json::from_str(&j)).transpose().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, collection: &str, id: &str, body: &Value) -> Result<(), Error> {
        let (collection, id) = (collection.to_string(), id.to_string());
        let json = serde_json::to_string(body)?;
        let updated_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO documents (collection, id, body_json, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(collection, id) DO UPDATE SET
                        body_json = excluded.body_json,
                        updated_at = excluded.updated_at",
                    params![collection, id, json, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn create(&self, collection: &str, id: &str, body: &Value) -> Result<bool, Error> {
        let (collection, id) = (collection.to_string(), id.to_string());
        let json = serde_json::to_string(body)?;
        let updated_at = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "INSERT INTO documents (collection, id, body_json, updated_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(collection, id) DO NOTHING",
                    params![collection, id, json, updated_at],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, Error> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn list(&self, collection: &str, id_prefix: &str) -> Result<Vec<(String, Value)>, Error> {
        let (collection, prefix) = (collection.to_string(), id_prefix.to_string());
        self.conn
            .call(move |conn| -> Result<Vec<(String, Value)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, body_json FROM documents
                    WHERE collection = ?1 AND substr(id, 1, length(?2)) = ?2
                    ORDER BY id",
                )?;
                let rows = stmt
                    .query_map(params![collection, prefix], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(id, json)| -> Result<(String, Value), Error> { Ok((id, serde_json::from_str(&json)?)) })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_delete() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put("trips", "u1/t1", &json!({"id": "t1"})).await.unwrap();

        assert_eq!(db.get("trips", "u1/t1").await.unwrap(), Some(json!({"id": "t1"})));
        assert_eq!(db.get("other", "u1/t1").await.unwrap(), None);

        assert!(db.delete("trips", "u1/t1").await.unwrap());
        assert!(!db.delete("trips", "u1/t1").await.unwrap());
        assert_eq!(db.get("trips", "u1/t1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put("trips", "a", &json!(1)).await.unwrap();
        db.put("trips", "a", &json!(2)).await.unwrap();
        assert_eq!(db.get("trips", "a").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_create_only_when_absent() {
        let db = StoreDb::open_in_memory().await.unwrap();
        assert!(db.create("trips", "a", &json!("first")).await.unwrap());
        assert!(!db.create("trips", "a", &json!("second")).await.unwrap());
        assert_eq!(db.get("trips", "a").await.unwrap(), Some(json!("first")));
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put("trips", "u1/b", &json!("b")).await.unwrap();
        db.put("trips", "u1/a", &json!("a")).await.unwrap();
        db.put("trips", "u10/c", &json!("c")).await.unwrap();
        db.put("history", "u1/d", &json!("d")).await.unwrap();

        let docs = db.list("trips", "u1/").await.unwrap();
        let ids: Vec<_> = docs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["u1/a", "u1/b"]);
    }

    #[tokio::test]
    async fn test_list_prefix_with_like_metacharacters() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put("trips", "user_%/x", &json!(1)).await.unwrap();
        db.put("trips", "userA%/y", &json!(2)).await.unwrap();

        let docs = db.list("trips", "user_%/").await.unwrap();
        assert_eq!(docs.len(), 1);
    }
}
