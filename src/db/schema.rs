//! SQL DDL for the index database.
//!
//! One `schema_meta` table holds bookkeeping. Each collection gets a pair of
//! tables: `<name>_records` for documents and metadata, and a sqlite-vec
//! `<name>_vec` virtual table for the embeddings. All DDL is idempotent.

use rusqlite::{Connection, OptionalExtension};

pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize the base schema. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Quoted table names for a collection. The name must already be validated.
pub fn collection_tables(collection: &str) -> (String, String) {
    (
        format!("\"{collection}_records\""),
        format!("\"{collection}_vec\""),
    )
}

/// Create the tables backing `collection` with vectors of `dimensions` floats.
pub fn create_collection(conn: &Connection, collection: &str, dimensions: usize) -> rusqlite::Result<()> {
    let (records, vectors) = collection_tables(collection);
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {records} (
            id TEXT PRIMARY KEY,
            document TEXT NOT NULL,
            metadata TEXT
        );
        CREATE VIRTUAL TABLE IF NOT EXISTS {vectors} USING vec0(
            id TEXT PRIMARY KEY,
            embedding FLOAT[{dimensions}]
        );"
    ))
}

pub fn drop_collection(conn: &Connection, collection: &str) -> rusqlite::Result<()> {
    let (records, vectors) = collection_tables(collection);
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {vectors};
         DROP TABLE IF EXISTS {records};"
    ))
}

pub fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}
