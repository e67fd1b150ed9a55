use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::model::AppState;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS snapshot (
    id       INTEGER PRIMARY KEY CHECK(id = 1),
    state    TEXT NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);
";

const UPSERT_SNAPSHOT: &str = "
INSERT INTO snapshot (id, state) VALUES (1, ?1)
ON CONFLICT(id) DO UPDATE SET
    state = excluded.state,
    saved_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
";

/// Where the whole `{goal, tasks}` snapshot lives between runs.
pub trait SnapshotStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<AppState>>;
    fn save(&self, state: &AppState) -> Result<()>;
}

fn set_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("failed to open {path}"))?;
    set_pragmas(&conn)?;
    Ok(conn)
}

pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    set_pragmas(&conn)?;
    init(&conn)?;
    Ok(conn)
}

/// Keeps the snapshot as JSON text in a single-row table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wrap an already-initialized connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &str) -> Result<Self> {
        let conn = open(path)?;
        init(&conn)?;
        Ok(Self { conn })
    }

    /// When the snapshot was last written, if ever.
    pub fn saved_at(&self) -> Result<Option<String>> {
        let saved_at = self
            .conn
            .query_row("SELECT saved_at FROM snapshot WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(saved_at)
    }
}

impl SnapshotStore for SqliteStore {
    fn load(&self) -> Result<Option<AppState>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT state FROM snapshot WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(raw) => {
                let state = serde_json::from_str(&raw).context("stored snapshot is malformed")?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    fn save(&self, state: &AppState) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        self.conn.execute(UPSERT_SNAPSHOT, [raw])?;
        Ok(())
    }
}
