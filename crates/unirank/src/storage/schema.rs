//! `SQLite` schema definitions for unirank.
//!
//! One schema serves both the local key-value store and the shared note log,
//! so a single file can host either or both.

/// SQL statement to create the key-value table backing local storage.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the shared note log.
pub const CREATE_REMOTE_NOTES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS remote_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    author TEXT NOT NULL,
    university TEXT NOT NULL,
    text TEXT NOT NULL,
    rating INTEGER,
    timestamp INTEGER NOT NULL
)
";

/// SQL statement to index the note log for most-recent-first reads.
pub const CREATE_REMOTE_NOTES_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_remote_notes_collection_timestamp
ON remote_notes(collection, timestamp DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_KV_TABLE,
    CREATE_REMOTE_NOTES_TABLE,
    CREATE_REMOTE_NOTES_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_kv_table_structure() {
        assert!(CREATE_KV_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_KV_TABLE.contains("value TEXT NOT NULL"));
    }

    #[test]
    fn test_remote_notes_table_structure() {
        assert!(CREATE_REMOTE_NOTES_TABLE.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(CREATE_REMOTE_NOTES_TABLE.contains("collection TEXT NOT NULL"));
        assert!(CREATE_REMOTE_NOTES_TABLE.contains("timestamp INTEGER NOT NULL"));
    }
}
