use super::BlobStore;
use crate::common::error::{Result, TrafficError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const UPSERT_SQL: &str = "INSERT INTO blobs (key, blob, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET blob=excluded.blob, updated_at=excluded.updated_at";

/// SQLite-backed blob store; one row per key
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::init(conn).map(|store| {
            info!("Opened blob store at {}", db_path.display());
            store
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS blobs (
                key         TEXT PRIMARY KEY,
                blob        BLOB NOT NULL,
                updated_at  INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| TrafficError::Store {
            message: "sqlite connection lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let blob = conn
            .query_row("SELECT blob FROM blobs WHERE key = ?1", params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(blob)
    }

    async fn save(&self, key: &str, blob: &[u8]) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(UPSERT_SQL, params![key, blob, chrono::Utc::now().timestamp()])?;
        debug!("Saved blob {} ({} bytes)", key, blob.len());
        Ok(())
    }

    async fn save_many(&self, entries: &[(&str, &[u8])]) -> Result<()> {
        let mut conn = self.conn()?;
        let now = chrono::Utc::now().timestamp();
        // Dropping the transaction without commit rolls back every entry
        let tx = conn.transaction()?;
        for &(key, blob) in entries {
            tx.execute(UPSERT_SQL, params![key, blob, now])?;
        }
        tx.commit()?;
        debug!("Saved {} blobs in one transaction", entries.len());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM blobs", [])?;
        Ok(())
    }
}
