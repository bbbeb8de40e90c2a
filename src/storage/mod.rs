pub mod migrations;
pub mod prefs;

use rusqlite::Connection;

use crate::errors::ClientError;

pub use prefs::{LocalStore, SavedLocation, RECENT_SEARCH_CAP};

pub fn open_db(path: &str) -> Result<Connection, ClientError> {
    let conn = Connection::open(path)?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
