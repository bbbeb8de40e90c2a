use rusqlite::Connection;

use crate::errors::ClientError;

/// Schema migrations embedded in the binary — the store lives on the
/// user's device, so there is no migrations directory to ship alongside.
/// Applied statements are tracked in `_migrations` and never re-run.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_prefs",
    "CREATE TABLE IF NOT EXISTS prefs (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );",
)];

pub fn run_migrations(conn: &Connection) -> Result<(), ClientError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
