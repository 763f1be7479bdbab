use crate::error::{BellaError, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub mod types;
pub use types::StoredEntry;

/// Durable string key-value storage
///
/// Values are opaque strings; callers store JSON.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value for a key, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Inserts or replaces a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Lists all entries ordered by key
    fn entries(&self) -> Result<Vec<StoredEntry>>;
}

/// SQLite-backed key-value store
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a new store instance
    ///
    /// Initializes the database file in the user's data directory, unless
    /// `BELLA_STORE_DB` points elsewhere.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("BELLA_STORE_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "bella", "bella")
            .ok_or_else(|| BellaError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| BellaError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("preferences.db"))
    }

    /// Create a new store that uses the specified database path
    ///
    /// # Examples
    ///
    /// ```
    /// use bella::storage::{KeyValueStore, SqliteStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("prefs.db")).unwrap();
    /// store.set("greeting", "\"ciao\"").unwrap();
    /// assert_eq!(store.get("greeting").unwrap().as_deref(), Some("\"ciao\""));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| BellaError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        tracing::debug!("Preference store at {}", store.db_path.display());
        Ok(store)
    }

    /// Path of the backing database file
    pub fn path(&self) -> &std::path::Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| BellaError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| BellaError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to read value")
            .map_err(|e| BellaError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .context("Failed to write value")
        .map_err(|e| BellaError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete value")
            .map_err(|e| BellaError::Storage(e.to_string()))?;
        Ok(())
    }

    fn entries(&self) -> Result<Vec<StoredEntry>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT key, value, updated_at FROM kv ORDER BY key")
            .context("Failed to prepare query")
            .map_err(|e| BellaError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let updated_at: String = row.get(2)?;
                Ok(StoredEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: DateTime::parse_from_rfc3339(&updated_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })
            .context("Failed to query entries")
            .map_err(|e| BellaError::Storage(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| BellaError::Storage(e.to_string()))?);
        }
        Ok(entries)
    }
}

/// In-process store, used for tests and when no database can be opened
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, (String, DateTime<Utc>)>>> {
        self.entries
            .lock()
            .map_err(|_| BellaError::Storage("Memory store lock poisoned".to_string()).into())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).map(|(value, _)| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?
            .insert(key.to_string(), (value.to_string(), Utc::now()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<StoredEntry>> {
        Ok(self
            .lock()?
            .iter()
            .map(|(key, (value, updated_at))| StoredEntry {
                key: key.clone(),
                value: value.clone(),
                updated_at: *updated_at,
            })
            .collect())
    }
}
