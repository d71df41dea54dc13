//! SQLite-backed blob store.
//!
//! # Responsibility
//! - Persist blobs as rows of the `blobs` table (one row per key).
//! - Create the table on first open and refuse databases from newer builds.
//!
//! # Invariants
//! - Connections run with `synchronous=FULL`; each save is a single upsert,
//!   committed before returning.
//! - The layout version lives in `PRAGMA user_version`; `0` means "fresh file".

use super::{BlobError, BlobResult, BlobStore};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};

/// Layout version written by this build.
pub const BLOB_SCHEMA_VERSION: u32 = 1;

const BLOB_SCHEMA: &str = include_str!("blobs_schema.sql");

/// `BlobStore` over a prepared SQLite connection.
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Opens (creating when missing) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> BlobResult<Self> {
        Self::connect("file", || Connection::open(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> BlobResult<Self> {
        Self::connect("memory", Connection::open_in_memory)
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Layout version recorded in the database.
    pub fn schema_version(&self) -> BlobResult<u32> {
        read_schema_version(&self.conn)
    }

    fn connect(
        mode: &'static str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> BlobResult<Self> {
        let started_at = Instant::now();
        let prepared = connect()
            .map_err(BlobError::from)
            .and_then(|mut conn| prepare(&mut conn).map(|()| conn));

        match prepared {
            Ok(conn) => {
                info!(
                    "event=blob_db_open module=blob status=ok mode={} duration_ms={}",
                    mode,
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn })
            }
            Err(err) => {
                error!(
                    "event=blob_db_open module=blob status=error mode={} duration_ms={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

impl BlobStore for SqliteBlobStore {
    fn load(&self, key: &str) -> BlobResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1;", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> BlobResult<()> {
        let result = self.conn.execute(
            "INSERT INTO blobs (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, bytes],
        );

        match result {
            Ok(_) => {
                debug!(
                    "event=blob_save module=blob status=ok backend=sqlite key={} bytes={}",
                    key,
                    bytes.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=blob_save module=blob status=error backend=sqlite key={} error={}",
                    key, err
                );
                Err(err.into())
            }
        }
    }
}

fn prepare(conn: &mut Connection) -> BlobResult<()> {
    conn.execute_batch("PRAGMA synchronous = FULL;")?;
    conn.busy_timeout(Duration::from_secs(5))?;

    match read_schema_version(conn)? {
        BLOB_SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(BLOB_SCHEMA)?;
            tx.execute_batch(&format!("PRAGMA user_version = {BLOB_SCHEMA_VERSION};"))?;
            tx.commit()?;
            info!(
                "event=blob_db_schema module=blob status=created version={}",
                BLOB_SCHEMA_VERSION
            );
            Ok(())
        }
        found => Err(BlobError::SchemaTooNew {
            found,
            supported: BLOB_SCHEMA_VERSION,
        }),
    }
}

fn read_schema_version(conn: &Connection) -> BlobResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
