use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::db::migration_runner::MigrationRunner;
use crate::error::{JournalError, Result};

pub struct Database {
    pub conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::initialize(conn, Some(db_path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?, None)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        let runner = MigrationRunner::new();

        log::info!("=== Starting database migration check ===");
        let applied = runner.run_pending_migrations(&conn, path.as_deref())?;
        if applied > 0 {
            log::info!("Applied {} migrations successfully", applied);
        } else {
            log::info!("Database schema is up to date");
        }

        runner.verify_migrations(&conn)?;
        if let Some(version) = runner.get_current_version(&conn)? {
            log::info!("Schema version: {}", version);
        }

        Ok(Database {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| JournalError::Database(e.to_string()))
    }

    /// Copy the whole database to `dest` with SQLite's online backup API and
    /// check the copy's integrity.
    pub fn backup_to(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        {
            let conn = self.lock()?;
            conn.backup(rusqlite::DatabaseName::Main, dest, None)?;
        }

        let copy = Connection::open(dest)?;
        let integrity: String = copy.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
        if integrity != "ok" {
            return Err(JournalError::Database(format!(
                "Backup integrity check failed: {}",
                integrity
            )));
        }

        log::info!("Database backed up to {}", dest.display());
        Ok(())
    }
}
