//! Key-value storage.
//!
//! A string-to-string table with the shape of browser local storage.

use super::connection::CacheDb;
use crate::Error;
use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Durable string storage keyed by name.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, Error>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;
    async fn remove_item(&self, key: &str) -> Result<(), Error>;
}

#[async_trait]
impl KeyValueStore for CacheDb {
    async fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        CacheDb::get_item(self, key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        CacheDb::set_item(self, key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), Error> {
        CacheDb::remove_item(self, key).await
    }
}

impl CacheDb {
    /// Read the value stored under `key`.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the value stored under `key`.
    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, value, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove `key`. Removing a missing key is not an error.
    pub async fn remove_item(&self, key: &str) -> Result<(), Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
