//! Storage layer for timelog.
//!
//! Persistence is exposed as the [`Store`] capability: load the whole group
//! collection, save the whole group collection. Two backends implement it:
//!
//! - [`Database`]: `SQLite` via `rusqlite`
//! - [`JsonStore`]: a single JSON file in the interchange format
//!
//! A store is opened once at startup and dropped at shutdown. Callers load a
//! snapshot, mutate it, and save it back; nothing is cached in between.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Use one store per thread or wrap it in a `Mutex`.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2024-01-15T10:30:00.000Z`), so lexicographic order matches
//! chronological order.
//!
//! ## Ordering
//!
//! Both tables carry a `position` column; [`Store::load`] returns groups and
//! entries in the order they were saved.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use thiserror::Error;

use tl_core::{Group, GroupId, TimeEntry, ValidationError};

mod json;

pub use json::{JsonStore, parse_groups, to_json};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Reading or writing a store file failed.
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A store file holds JSON that is not a group collection.
    #[error("invalid group data in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for group {group_id}: {timestamp}")]
    TimestampParse {
        group_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row violates a domain invariant.
    #[error("invalid stored data for group {group_id}")]
    Invalid {
        group_id: String,
        #[source]
        source: ValidationError,
    },
}

/// Load/save access to the full group collection.
pub trait Store {
    /// Loads every group, in saved order. An empty store yields an empty list.
    fn load(&self) -> Result<Vec<Group>, StoreError>;

    /// Replaces the stored collection with `groups`.
    fn save(&mut self, groups: &[Group]) -> Result<(), StoreError>;
}

/// `SQLite`-backed store.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                running INTEGER NOT NULL DEFAULT 0,
                started_at TEXT,
                archived INTEGER NOT NULL DEFAULT 0
            );

            -- Entries: completed intervals owned by a group
            -- start_at/end_at: RFC 3339 with milliseconds
            -- duration_secs: floor((end - start) / 1000), stored as given
            CREATE TABLE IF NOT EXISTS entries (
                group_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                PRIMARY KEY (group_id, position),
                FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_entries_start ON entries(start_at);
            ",
        )?;
        Ok(())
    }

    fn load_entries(&self, group_id: &str) -> Result<Vec<TimeEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT start_at, end_at, duration_secs
            FROM entries
            WHERE group_id = ?
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([group_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (start, end, duration) = row?;
            entries.push(TimeEntry {
                start: parse_timestamp(&start, group_id)?,
                end: parse_timestamp(&end, group_id)?,
                duration,
            });
        }
        Ok(entries)
    }
}

impl Store for Database {
    fn load(&self) -> Result<Vec<Group>, StoreError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, running, started_at, archived
            FROM groups
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?;

        let mut groups = Vec::new();
        for row in rows {
            let (id, name, running, started_at, archived) = row?;
            let started_at = started_at
                .as_deref()
                .map(|ts| parse_timestamp(ts, &id))
                .transpose()?;
            let logs = self.load_entries(&id)?;
            let id = GroupId::new(id.clone()).map_err(|source| StoreError::Invalid {
                group_id: id,
                source,
            })?;
            groups.push(Group {
                id,
                name,
                logs,
                running,
                started_at,
                archived,
            });
        }
        tracing::debug!(groups = groups.len(), "loaded groups from sqlite");
        Ok(groups)
    }

    fn save(&mut self, groups: &[Group]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM groups", [])?;
        {
            let mut group_stmt = tx.prepare(
                "
                INSERT INTO groups (id, position, name, running, started_at, archived)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            let mut entry_stmt = tx.prepare(
                "
                INSERT INTO entries (group_id, position, start_at, end_at, duration_secs)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for (position, group) in groups.iter().enumerate() {
                group_stmt.execute(params![
                    group.id.as_str(),
                    position,
                    group.name,
                    group.running,
                    group.started_at.map(format_timestamp),
                    group.archived,
                ])?;
                for (entry_position, entry) in group.logs.iter().enumerate() {
                    entry_stmt.execute(params![
                        group.id.as_str(),
                        entry_position,
                        format_timestamp(entry.start),
                        format_timestamp(entry.end),
                        entry.duration,
                    ])?;
                }
            }
        }
        tx.commit()?;
        tracing::debug!(groups = groups.len(), "saved groups to sqlite");
        Ok(())
    }
}

fn parse_timestamp(timestamp: &str, group_id: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| StoreError::TimestampParse {
            group_id: group_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
