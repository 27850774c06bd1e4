// Database schema: table creation and migrations.
//
// A `schema_version` table tracks which migrations have run; each migration
// is a closure that executes its SQL once.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet. Idempotent.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS incidents (
            id TEXT PRIMARY KEY,               -- UUID v4
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            reported_at TEXT NOT NULL,         -- UTC 'YYYY-MM-DD HH:MM:SS'
            waste_type TEXT,                   -- category label, null until processed
            confidence REAL,                   -- 0.0 to 1.0
            keywords TEXT,                     -- JSON array of strings
            embedding TEXT,                    -- JSON array of floats
            similar_ids TEXT,                  -- JSON array of UUIDs
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_incidents_reported
            ON incidents(reported_at);

        CREATE INDEX IF NOT EXISTS idx_incidents_waste_type
            ON incidents(waste_type);

        CREATE INDEX IF NOT EXISTS idx_incidents_location
            ON incidents(location);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: record which arbitration rule produced the label, so a
    // keyword fallback can be told apart from a semantic classification.
    run_migration(conn, 2, |c| {
        c.execute_batch("ALTER TABLE incidents ADD COLUMN classification_basis TEXT;")
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count user tables (used for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
