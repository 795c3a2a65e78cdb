// SPDX-FileCopyrightText: 2026 MiniMedi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed durable persistence.
//!
//! Entries live in a single `kv_store` table. Every `save` is committed
//! before it returns, so session state survives a process restart.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use minimedi_config::model::StorageConfig;
use minimedi_core::{MinimediError, PersistencePort};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::migrations;

/// A [`PersistencePort`] over a SQLite database file.
pub struct SqlitePersistence {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqlitePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePersistence").finish_non_exhaustive()
    }
}

impl SqlitePersistence {
    /// Opens (creating if needed) the database described by `config` and runs migrations.
    pub fn open(config: &StorageConfig) -> Result<Self, MinimediError> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(MinimediError::storage)?;
            }
        }

        let conn = Connection::open(path).map_err(MinimediError::storage)?;
        let store = Self::init(conn, config.wal_mode)?;
        info!(path = config.database_path.as_str(), "session storage opened");
        Ok(store)
    }

    /// Opens a private in-memory database (no durability; useful in tests).
    pub fn open_in_memory() -> Result<Self, MinimediError> {
        let conn = Connection::open_in_memory().map_err(MinimediError::storage)?;
        Self::init(conn, false)
    }

    fn init(mut conn: Connection, wal_mode: bool) -> Result<Self, MinimediError> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(MinimediError::storage)?;
        if wal_mode {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(MinimediError::storage)?;
            debug!(journal_mode = mode.as_str(), "journal mode set");
        }
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(MinimediError::storage)?;

        migrations::run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistencePort for SqlitePersistence {
    fn load(&self, key: &str) -> Result<Option<String>, MinimediError> {
        self.lock()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(MinimediError::storage)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), MinimediError> {
        self.lock()
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![key, value],
            )
            .map_err(MinimediError::storage)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MinimediError> {
        self.lock()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(MinimediError::storage)?;
        Ok(())
    }
}
