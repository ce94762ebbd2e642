//! Document store with two interchangeable backends
//!
//! The whole application state is one JSON document. The flat-file
//! backend is the unconditional fallback; an embedded SQLite mirror is
//! used opportunistically when it can be opened, holding the identical
//! document serialized as a single blob value. Every mutation is a full
//! read/modify/write cycle serialized behind one mutex, so two in-flight
//! handlers can never interleave between their read and write steps.

use std::path::{Path, PathBuf};

use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::warn;

use crate::document::Document;
use crate::error::StoreResult;

/// Flat JSON file backend. Reads fall back to an empty default document
/// on a missing or unreadable file; writes go through a temp file and
/// rename so a crash mid-write never truncates the data.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn read(&self) -> Document {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!("data file {} is not valid JSON: {e}", self.path.display());
                Document::default()
            }),
            Err(_) => Document::default(),
        }
    }

    pub async fn write(&self, doc: &Document) -> StoreResult<()> {
        let body = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Embedded SQLite mirror: one `store` table keyed by `'data'` whose
/// value is the serialized document.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the mirror database. On a fresh
    /// database an existing JSON data file is migrated into the table
    /// so switching backends never loses state.
    pub async fn open(path: &Path, json_seed: &JsonFileStore) -> StoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query("CREATE TABLE IF NOT EXISTS store (k TEXT PRIMARY KEY, v TEXT NOT NULL)")
            .execute(&pool)
            .await?;

        let existing = sqlx::query("SELECT v FROM store WHERE k = 'data'")
            .fetch_optional(&pool)
            .await?;
        if existing.is_none() {
            let seeded = json_seed.read().await;
            let body = serde_json::to_string(&seeded)?;
            sqlx::query("INSERT OR REPLACE INTO store (k, v) VALUES ('data', ?1)")
                .bind(body)
                .execute(&pool)
                .await?;
        }

        Ok(Self { pool })
    }

    pub async fn read(&self) -> StoreResult<Document> {
        let row = sqlx::query("SELECT v FROM store WHERE k = 'data'")
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let body: String = row.get("v");
                Ok(serde_json::from_str(&body)?)
            }
            None => Ok(Document::default()),
        }
    }

    pub async fn write(&self, doc: &Document) -> StoreResult<()> {
        let body = serde_json::to_string(doc)?;
        sqlx::query("INSERT OR REPLACE INTO store (k, v) VALUES ('data', ?1)")
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// The document store used by the service: SQLite mirror when
/// available, JSON file otherwise, with every read-modify-write cycle
/// serialized behind `lock`.
pub struct DocumentStore {
    json: JsonFileStore,
    sqlite: Option<SqliteStore>,
    lock: Mutex<()>,
}

impl DocumentStore {
    /// Opens the store, probing the SQLite mirror when `sqlite_path` is
    /// given. Probe failures are logged and demote the store to the
    /// flat-file backend; they are never fatal.
    pub async fn open(json_path: impl Into<PathBuf>, sqlite_path: Option<&Path>) -> Self {
        let json = JsonFileStore::new(json_path);
        let sqlite = match sqlite_path {
            Some(path) => match SqliteStore::open(path, &json).await {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!("sqlite mirror unavailable, using JSON file only: {e}");
                    None
                }
            },
            None => None,
        };
        Self {
            json,
            sqlite,
            lock: Mutex::new(()),
        }
    }

    /// A store backed purely by the JSON file. Used by tests and by the
    /// seed tool.
    pub fn json_only(json_path: impl Into<PathBuf>) -> Self {
        Self {
            json: JsonFileStore::new(json_path),
            sqlite: None,
            lock: Mutex::new(()),
        }
    }

    pub fn sqlite_active(&self) -> bool {
        self.sqlite.is_some()
    }

    async fn read_inner(&self) -> Document {
        if let Some(sqlite) = &self.sqlite {
            match sqlite.read().await {
                Ok(doc) => return doc,
                Err(e) => warn!("sqlite read failed, falling back to JSON file: {e}"),
            }
        }
        self.json.read().await
    }

    async fn write_inner(&self, doc: &Document) -> StoreResult<()> {
        if let Some(sqlite) = &self.sqlite {
            match sqlite.write(doc).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!("sqlite write failed, falling back to JSON file: {e}"),
            }
        }
        self.json.write(doc).await
    }

    /// Reads a consistent snapshot of the document.
    pub async fn read(&self) -> Document {
        let _guard = self.lock.lock().await;
        self.read_inner().await
    }

    /// Runs a read-modify-write cycle under the store mutex. When the
    /// closure fails nothing is persisted; the outer error reports a
    /// persistence failure.
    pub async fn update<T, E, F>(&self, f: F) -> StoreResult<Result<T, E>>
    where
        F: FnOnce(&mut Document) -> Result<T, E>,
    {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_inner().await;
        match f(&mut doc) {
            Ok(value) => {
                self.write_inner(&doc).await?;
                Ok(Ok(value))
            }
            Err(e) => Ok(Err(e)),
        }
    }
}
