use rusqlite::{OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;

use crate::db::connection::Database;
use crate::db::migration_runner::current_timestamp;
use crate::document::JournalDocument;
use crate::error::{JournalError, Result};
use crate::ledger::Ledger;

pub const DEFAULT_DOCUMENT_KEY: &str = "trade_journal";

/// Previous snapshots kept per document key.
const REVISIONS_TO_KEEP: i64 = 5;

/// Persistence for the whole journal document. A save either replaces the
/// previous snapshot entirely or fails leaving it untouched.
pub trait DocumentStore {
    fn save(&self, document: &JournalDocument) -> Result<()>;

    fn load(&self) -> Result<Option<JournalDocument>>;

    fn clear(&self) -> Result<()>;

    fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        self.save(&ledger.serialize())
    }

    /// Load the persisted ledger, or an empty one when nothing was saved yet.
    fn load_ledger(&self) -> Result<Ledger> {
        match self.load()? {
            Some(document) => Ledger::deserialize(document),
            None => Ok(Ledger::default()),
        }
    }
}

/// Document store backed by a single row in SQLite.
pub struct SqliteStore {
    db: Database,
    key: String,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self::with_key(db, DEFAULT_DOCUMENT_KEY)
    }

    pub fn with_key(db: Database, key: &str) -> Self {
        Self {
            db,
            key: key.to_string(),
        }
    }

    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(db_path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Number of earlier snapshots retained for this key.
    pub fn revision_count(&self) -> Result<usize> {
        let conn = self.db.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM document_revisions WHERE key = ?",
            [&self.key],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Most recent earlier snapshot, newest first by `offset`.
    pub fn load_revision(&self, offset: usize) -> Result<Option<JournalDocument>> {
        let conn = self.db.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM document_revisions WHERE key = ? ORDER BY id DESC LIMIT 1 OFFSET ?",
                params![self.key, offset as i64],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| JournalDocument::from_json(&b)).transpose()
    }
}

impl DocumentStore for SqliteStore {
    fn save(&self, document: &JournalDocument) -> Result<()> {
        let body = document.to_json()?;
        let now = current_timestamp();

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO document_revisions (key, body, saved_at)
             SELECT key, body, updated_at FROM documents WHERE key = ?",
            [&self.key],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO documents (key, body, updated_at) VALUES (?, ?, ?)",
            params![self.key, body, now],
        )?;
        tx.execute(
            "DELETE FROM document_revisions WHERE key = ?1 AND id NOT IN (
                SELECT id FROM document_revisions WHERE key = ?1 ORDER BY id DESC LIMIT ?2
             )",
            params![self.key, REVISIONS_TO_KEEP],
        )?;

        tx.commit()?;
        log::debug!("Saved journal document '{}' ({} bytes)", self.key, body.len());
        Ok(())
    }

    fn load(&self) -> Result<Option<JournalDocument>> {
        let conn = self.db.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE key = ?",
                [&self.key],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => {
                log::debug!("Loaded journal document '{}'", self.key);
                Ok(Some(JournalDocument::from_json(&body)?))
            }
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<()> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM documents WHERE key = ?", [&self.key])?;
        tx.execute("DELETE FROM document_revisions WHERE key = ?", [&self.key])?;
        tx.commit()?;
        log::info!("Cleared journal document '{}'", self.key);
        Ok(())
    }
}

/// In-process store for environments without a database file. Holds the
/// serialized JSON so loads go through the same parsing as on-disk data.
#[derive(Default)]
pub struct MemoryStore {
    body: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn save(&self, document: &JournalDocument) -> Result<()> {
        let body = document.to_json()?;
        let mut slot = self
            .body
            .lock()
            .map_err(|e| JournalError::Database(e.to_string()))?;
        *slot = Some(body);
        Ok(())
    }

    fn load(&self) -> Result<Option<JournalDocument>> {
        let slot = self
            .body
            .lock()
            .map_err(|e| JournalError::Database(e.to_string()))?;
        slot.as_deref().map(JournalDocument::from_json).transpose()
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .body
            .lock()
            .map_err(|e| JournalError::Database(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}
