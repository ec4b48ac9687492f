//! Opening the karuta store.
//!
//! One SQLite file holds the controller's named caches and the search
//! history's key-value items. Opening it sets WAL journaling and brings the
//! schema up to date.

use std::path::Path;

use tokio_rusqlite::Connection;

use super::migrations;
use crate::Error;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Handle to the store.
///
/// Clones share one background connection, so the cache controller and the
/// search history can each hold their own copy.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open (or create) the store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        let db = Self::init(conn).await?;
        tracing::debug!(path = %path.display(), "opened cache store");
        Ok(db)
    }

    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await.map_err(Error::Database)?;
        migrations::run(&conn).await?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StoredResponse;

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let enabled: i64 = db
            .conn
            .call(|conn| conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_clones_share_caches_and_items() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let history_handle = db.clone();

        db.open_cache("karuta-static-v3.0.0").await.unwrap();
        history_handle.set_item("karuta-search-history", "[\"rust\"]").await.unwrap();

        assert_eq!(history_handle.cache_names().await.unwrap(), vec!["karuta-static-v3.0.0"]);
        assert_eq!(db.get_item("karuta-search-history").await.unwrap().as_deref(), Some("[\"rust\"]"));
    }

    #[tokio::test]
    async fn test_deleting_cache_drops_its_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let resp = StoredResponse {
            url: "/".into(),
            status: 200,
            content_type: Some("text/html".into()),
            body: b"home".to_vec(),
            stored_at: "2026-01-01T00:00:00Z".into(),
        };
        db.put_response("karuta-static-v2.0.0", &resp).await.unwrap();
        assert!(db.delete_cache("karuta-static-v2.0.0").await.unwrap());

        let orphans: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
