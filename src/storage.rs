//! Persistence gateway: the two task collections as JSON values in a
//! key-value store.
//!
//! Reads never fail. A missing or unreadable entry loads as an empty
//! collection, independently for each key. Writes replace both entries
//! together.
//!
//! Several processes may share one database, so each backend also reports a
//! change counter that moves when some other writer commits.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::warn;
use rusqlite::{Connection, OptionalExtension};

use crate::db;
use crate::model::Task;

pub const TASKS_KEY: &str = "tasks";
pub const DELETED_KEY: &str = "deletedTasks";

/// A durable string-to-string store.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write every entry, or none of them.
    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<()>;

    /// A value that differs from an earlier reading once another writer has
    /// committed in between. Storage with no other writers may keep the
    /// default.
    fn version(&self) -> Result<u64> {
        Ok(0)
    }
}

/// Both collections as read from storage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Collections {
    pub active: Vec<Task>,
    pub deleted: Vec<Task>,
}

pub fn load(storage: &dyn Storage) -> Collections {
    Collections {
        active: load_key(storage, TASKS_KEY),
        deleted: load_key(storage, DELETED_KEY),
    }
}

fn load_key(storage: &dyn Storage, key: &str) -> Vec<Task> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("failed to read '{key}', starting empty: {e:#}");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!("stored '{key}' is not a valid task list, starting empty: {e}");
            Vec::new()
        }
    }
}

pub fn save(storage: &mut dyn Storage, active: &[Task], deleted: &[Task]) -> Result<()> {
    let tasks = serde_json::to_string(active).context("failed to encode tasks")?;
    let deleted = serde_json::to_string(deleted).context("failed to encode deleted tasks")?;
    storage
        .set_all(&[(TASKS_KEY, tasks), (DELETED_KEY, deleted)])
        .context("failed to save tasks")
}

/// SQLite-backed storage, one row per key in the `kv` table.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = db::open(path).with_context(|| format!("failed to open database {path}"))?;
        db::init(&conn)?;
        Ok(Self { conn })
    }

    /// Wrap an already-initialized connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
                rusqlite::params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn version(&self) -> Result<u64> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(version as u64)
    }
}

/// In-process storage. Clones share the same entries, so a test can keep a
/// handle and inspect or corrupt what a store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<Cell<u64>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    fn set_all(&mut self, entries: &[(&str, String)]) -> Result<()> {
        let mut map = self.entries.borrow_mut();
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn version(&self) -> Result<u64> {
        Ok(self.writes.get())
    }
}
