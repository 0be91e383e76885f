// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use patio_app::{RecentSearches, StoredColumns};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const APP_NAME: &str = "patio";

/// Keys of the client-local settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    ColumnVisibility,
    ColumnOrder,
    RecentSearches,
}

impl StorageKey {
    pub const ALL: [Self; 3] = [
        Self::ColumnVisibility,
        Self::ColumnOrder,
        Self::RecentSearches,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColumnVisibility => "dashboardColumnVisibility",
            Self::ColumnOrder => "dashboardColumnOrder",
            Self::RecentSearches => "dashboardRecentSearches",
        }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn bootstrap(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS local_storage (
                  key TEXT PRIMARY KEY,
                  value TEXT NOT NULL,
                  updated_at TEXT NOT NULL
                );
                ",
            )
            .context("create local_storage table")
    }

    pub fn get_raw(&self, key: StorageKey) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read {}", key.as_str()))
    }

    pub fn put_raw(&self, key: StorageKey, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO local_storage (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key.as_str(), value, now],
            )
            .with_context(|| format!("write {}", key.as_str()))?;
        Ok(())
    }

    pub fn remove(&self, key: StorageKey) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM local_storage WHERE key = ?",
                params![key.as_str()],
            )
            .with_context(|| format!("remove {}", key.as_str()))?;
        Ok(())
    }

    /// Missing or undecodable values read as `None`; corruption is logged,
    /// never surfaced.
    pub fn load_json<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::warn!(key = key.as_str(), %error, "ignoring corrupt stored value");
                Ok(None)
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, key: StorageKey, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("encode {}", key.as_str()))?;
        self.put_raw(key, &raw)
    }

    pub fn load_columns(&self) -> Result<StoredColumns> {
        Ok(StoredColumns {
            visibility: self.load_json::<BTreeMap<String, bool>>(StorageKey::ColumnVisibility)?,
            order: self.load_json::<Vec<String>>(StorageKey::ColumnOrder)?,
        })
    }

    pub fn save_columns(&self, columns: &StoredColumns) -> Result<()> {
        if let Some(visibility) = &columns.visibility {
            self.save_json(StorageKey::ColumnVisibility, visibility)?;
        }
        if let Some(order) = &columns.order {
            self.save_json(StorageKey::ColumnOrder, order)?;
        }
        Ok(())
    }

    pub fn load_recent_searches(&self, cap: usize) -> Result<RecentSearches> {
        let stored = self
            .load_json::<Vec<String>>(StorageKey::RecentSearches)?
            .unwrap_or_default();
        Ok(RecentSearches::from_stored(stored, cap))
    }

    pub fn save_recent_searches(&self, entries: &[String]) -> Result<()> {
        self.save_json(StorageKey::RecentSearches, &entries)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("PATIO_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set PATIO_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("patio.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
