//! SQLite storage.
//!
//! One file holds three tables:
//! - `kv`: the flat key/value map behind [`SessionStore`](super::SessionStore)
//! - `items`: the catalog of selectable activities
//! - `records`: completed focus phases per item

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use super::kv::KvBackend;
use crate::error::{CoreError, StoreError};

/// Names offered when the catalog is empty.
pub const DEFAULT_ITEMS: [&str; 9] = [
    "Reading",
    "Chores",
    "Gaming",
    "English",
    "Coding",
    "Drawing",
    "Exercise",
    "Meditation",
    "Writing",
];

/// A selectable activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
}

/// One completed focus phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRecord {
    pub id: i64,
    pub item_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Read-only view of the item catalog, the source of `start`'s item list.
pub trait ItemCatalog {
    fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError>;
}

/// SQLite database for session state, catalog and history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/focusloop.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("focusloop.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the schema created.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS items (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS records (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                item_name  TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at   TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_records_item_name ON records(item_name);",
        )?;
        Ok(())
    }

    // ── kv ───────────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store.
    pub fn kv_remove(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Set and remove several keys in one transaction.
    pub fn kv_set_many(&self, writes: &[(&str, Option<&str>)]) -> Result<(), rusqlite::Error> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in writes {
            match value {
                Some(value) => tx.execute(
                    "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?,
                None => tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?,
            };
        }
        tx.commit()
    }

    // ── items ────────────────────────────────────────────────────────

    /// Add an item, returning its id.
    pub fn add_item(&self, name: &str) -> Result<i64, StoreError> {
        self.conn
            .execute("INSERT INTO items (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Rename an item. Returns false if no item has that id.
    pub fn rename_item(&self, id: i64, name: &str) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute("UPDATE items SET name = ?1 WHERE id = ?2", params![name, id])?;
        Ok(changed > 0)
    }

    /// Delete an item together with its focus history.
    /// Returns false if no item has that id.
    pub fn delete_item(&self, id: i64) -> Result<bool, StoreError> {
        let name: Option<String> = self
            .conn
            .query_row("SELECT name FROM items WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(name) = name else {
            return Ok(false);
        };
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM records WHERE item_name = ?1", params![name])?;
        tx.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(true)
    }

    /// Insert [`DEFAULT_ITEMS`] if the catalog is empty. Returns how many were added.
    pub fn seed_default_items(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(0);
        }
        for name in DEFAULT_ITEMS {
            self.add_item(name)?;
        }
        tracing::debug!(count = DEFAULT_ITEMS.len(), "seeded default catalog items");
        Ok(DEFAULT_ITEMS.len())
    }

    // ── records ──────────────────────────────────────────────────────

    /// Record a completed focus phase.
    pub fn save_record(
        &self,
        item_name: &str,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO records (item_name, started_at, ended_at) VALUES (?1, ?2, ?3)",
            params![item_name, started_at.to_rfc3339(), ended_at.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Focus history for an item, newest first.
    pub fn records_for(&self, item_name: &str) -> Result<Vec<FocusRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_name, started_at, ended_at
             FROM records
             WHERE item_name = ?1
             ORDER BY started_at DESC",
        )?;
        let rows = stmt.query_map(params![item_name], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, item_name, started_at, ended_at) = row?;
            records.push(FocusRecord {
                id,
                item_name,
                started_at: parse_timestamp("started_at", &started_at)?,
                ended_at: parse_timestamp("ended_at", &ended_at)?,
            });
        }
        Ok(records)
    }

    /// Delete one record. Returns false if no record has that id.
    pub fn delete_record(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Delete all records for an item. Returns how many were removed.
    pub fn delete_records_for(&self, item_name: &str) -> Result<usize, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM records WHERE item_name = ?1", params![item_name])?;
        Ok(changed)
    }
}

fn parse_timestamp(key: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            value: value.to_string(),
        })
}

impl ItemCatalog for Database {
    fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM items ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(CatalogItem {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

impl KvBackend for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.kv_get(key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.kv_set(key, value)?)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        Ok(self.kv_remove(key)?)
    }

    fn set_many(&mut self, writes: &[(&str, Option<&str>)]) -> Result<(), StoreError> {
        Ok(self.kv_set_many(writes)?)
    }
}
