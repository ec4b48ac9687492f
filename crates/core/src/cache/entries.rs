//! Named cache operations.
//!
//! Mirrors the browser cache-storage surface: caches are opened by name,
//! hold one stored response per URL, and are deleted as a whole.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response persisted in a named cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoredResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    pub fn new(url: impl Into<String>, status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self { url: url.into(), status, content_type, body, stored_at: chrono::Utc::now().to_rfc3339() }
    }
}

fn read_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredResponse> {
    Ok(StoredResponse {
        url: row.get(0)?,
        status: row.get(1)?,
        content_type: row.get(2)?,
        body: row.get(3)?,
        stored_at: row.get(4)?,
    })
}

impl CacheDb {
    /// Create the named cache if it does not exist yet.
    pub async fn open_cache(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_names (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List cache names in creation order.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_names ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a named cache and every entry in it.
    ///
    /// Returns false if no cache with that name existed.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_names WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response in the named cache, replacing any entry for the same URL.
    ///
    /// Opens the cache implicitly.
    pub async fn put_response(&self, cache_name: &str, response: &StoredResponse) -> Result<(), Error> {
        let cache_name = cache_name.to_string();
        let response = response.clone();
        let key_hash = compute_cache_key(&cache_name, &response.url);
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_names (name, created_at) VALUES (?1, ?2)",
                    params![cache_name, now],
                )?;
                conn.execute(
                    "INSERT INTO cache_entries (key_hash, cache_name, url, status, content_type, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        status = excluded.status,
                        content_type = excluded.content_type,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        key_hash,
                        cache_name,
                        &response.url,
                        response.status,
                        &response.content_type,
                        &response.body,
                        &response.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a URL inside one named cache.
    pub async fn match_in(&self, cache_name: &str, url: &str) -> Result<Option<StoredResponse>, Error> {
        let key_hash = compute_cache_key(cache_name, url);
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, content_type, body, stored_at FROM cache_entries WHERE key_hash = ?1",
                )?;

                match stmt.query_row(params![key_hash], read_response) {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a URL across all caches, oldest cache first.
    pub async fn match_any(&self, url: &str) -> Result<Option<StoredResponse>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.url, e.status, e.content_type, e.body, e.stored_at
                    FROM cache_entries e JOIN cache_names n ON n.name = e.cache_name
                    WHERE e.url = ?1
                    ORDER BY n.rowid ASC
                    LIMIT 1",
                )?;

                match stmt.query_row(params![url], read_response) {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// URLs stored in the named cache, in insertion order.
    pub async fn cache_keys(&self, cache_name: &str) -> Result<Vec<String>, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE cache_name = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![cache_name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
