//! `SQLite` schema definitions for medsense.
//!
//! The database is a thin key-value layer: `slots` holds named JSON
//! payloads, `metadata` holds small settings such as the schema version and
//! the user's notification consent.

/// SQL statement to create the slots table.
pub const CREATE_SLOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS slots (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Tables created by schema version 1. `metadata` is created before any
/// migration runs, since it holds the version itself.
pub const V1_STATEMENTS: &[&str] = &[CREATE_SLOTS_TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_statements_not_empty() {
        assert!(!V1_STATEMENTS.is_empty());
        for stmt in V1_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_slots_table_contains_required_columns() {
        assert!(CREATE_SLOTS_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_SLOTS_TABLE.contains("value TEXT NOT NULL"));
        assert!(CREATE_SLOTS_TABLE.contains("updated_at TEXT NOT NULL"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
