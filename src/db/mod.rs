pub mod schema;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the index database at the given path, with sqlite-vec
/// loaded and the base schema initialized.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    // a second process indexing the same project waits instead of failing
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;

    schema::init_schema(&conn).context("failed to initialize schema")?;

    tracing::debug!(path = %path.display(), "index database opened");
    Ok(conn)
}

/// Open an existing index database without modifying it. No schema is
/// created and the journal mode is left as it is.
pub fn open_read_only(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    load_sqlite_vec();
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open database at {} read-only", path.display()))
}

/// Open an in-memory database, used by tests and throwaway indexes.
pub fn open_memory_database() -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_connection_rejects_writes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("index.db");
        drop(open_database(&path).unwrap());

        let conn = open_read_only(&path).unwrap();
        assert_eq!(
            schema::get_meta(&conn, "schema_version").unwrap().as_deref(),
            Some("1")
        );
        assert!(schema::set_meta(&conn, "k", "v").is_err());
    }

    #[test]
    fn read_only_open_does_not_create_a_database() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("absent.db");
        assert!(open_read_only(&path).is_err());
        assert!(!path.exists());
    }
}
