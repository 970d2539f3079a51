use rusqlite::{Connection, OptionalExtension, Result, params};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Pre-migration backups kept next to the database.
const BACKUPS_TO_KEEP: usize = 5;

#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn new(version: u32, name: &'static str, sql: &'static str) -> Self {
        Self { version, name, sql }
    }

    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

pub struct MigrationRunner {
    migrations: Vec<Migration>,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationRunner {
    pub fn new() -> Self {
        Self {
            migrations: vec![
                Migration::new(0, "bootstrap", include_str!("migrations/000_bootstrap.sql")),
                Migration::new(1, "documents", include_str!("migrations/001_documents.sql")),
                Migration::new(
                    2,
                    "document_revisions",
                    include_str!("migrations/002_document_revisions.sql"),
                ),
            ],
        }
    }

    /// Apply every migration newer than the recorded schema version. File
    /// databases that already carry a schema are backed up first.
    pub fn run_pending_migrations(&self, conn: &Connection, db_path: Option<&Path>) -> Result<usize> {
        let current_version = self.get_current_version(conn)?;

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| current_version.is_none_or(|v| m.version > v))
            .collect();

        let Some(target) = pending.last() else {
            return Ok(0);
        };

        log::info!(
            "Found {} pending migrations (current version {:?}, target {})",
            pending.len(),
            current_version,
            target.version
        );

        if let (Some(path), Some(_)) = (db_path, current_version) {
            let backup_path = create_backup(conn, path, target.version)?;
            log::info!("Backup created: {}", backup_path.display());
        }

        let mut applied = 0;
        for migration in pending {
            if let Err(e) = self.apply_migration(conn, migration) {
                log::error!("Migration {} ({}) failed: {}", migration.version, migration.name, e);
                return Err(e);
            }
            applied += 1;
        }

        Ok(applied)
    }

    fn apply_migration(&self, conn: &Connection, migration: &Migration) -> Result<()> {
        let start = Instant::now();
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms)
             VALUES (?, ?, ?, ?, ?)",
            params![
                migration.version,
                migration.name,
                current_timestamp(),
                migration.checksum(),
                start.elapsed().as_millis() as i64
            ],
        )?;

        tx.commit()?;
        log::info!("Applied migration {}: {}", migration.version, migration.name);
        Ok(())
    }

    /// Fail if an applied migration's SQL changed after it ran.
    pub fn verify_migrations(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT version, name, checksum FROM schema_migrations WHERE checksum IS NOT NULL ORDER BY version",
        )?;
        let applied: Vec<(u32, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<_>>>()?;

        for (version, name, stored_checksum) in applied {
            if let Some(migration) = self.migrations.iter().find(|m| m.version == version) {
                if stored_checksum != migration.checksum() {
                    log::error!("Checksum mismatch for migration {} ({})", version, name);
                    return Err(sqlite_failure(format!(
                        "Checksum mismatch for migration {} ({})",
                        version, name
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn get_current_version(&self, conn: &Connection) -> Result<Option<u32>> {
        if !has_schema_migrations_table(conn)? {
            return Ok(None);
        }

        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()
        .map(Option::flatten)
    }
}

fn has_schema_migrations_table(conn: &Connection) -> Result<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn sqlite_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(1), Some(message))
}

fn create_backup(conn: &Connection, db_path: &Path, target_version: u32) -> Result<PathBuf> {
    let backup_dir = db_path
        .parent()
        .ok_or_else(|| rusqlite::Error::InvalidPath(db_path.to_path_buf()))?
        .join("backups");

    fs::create_dir_all(&backup_dir)
        .map_err(|e| sqlite_failure(format!("Failed to create backup directory: {}", e)))?;

    let backup_path = backup_dir.join(format!(
        "pre_migration_v{}_{}.db",
        target_version,
        current_timestamp()
    ));
    conn.backup(rusqlite::DatabaseName::Main, &backup_path, None)?;

    cleanup_old_backups(&backup_dir);
    Ok(backup_path)
}

fn cleanup_old_backups(backup_dir: &Path) {
    let Ok(entries) = fs::read_dir(backup_dir) else {
        log::warn!("Failed to read backup directory {}", backup_dir.display());
        return;
    };

    let mut backups: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("pre_migration_") && name.ends_with(".db"))
        })
        .collect();

    backups.sort_by_key(|entry| {
        entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH)
    });

    if backups.len() > BACKUPS_TO_KEEP {
        for entry in backups.iter().take(backups.len() - BACKUPS_TO_KEEP) {
            if let Err(e) = fs::remove_file(entry.path()) {
                log::warn!("Failed to delete old backup: {}", e);
            }
        }
    }
}

pub(crate) fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
