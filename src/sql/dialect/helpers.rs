//! Shared helper functions for SQL dialect implementations.
//!
//! Dialects compose these to implement the `SqlDialect` trait with minimal
//! duplication.

use crate::dataset::ColumnType;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: SQLite, Postgres, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Placeholders
// =============================================================================

/// Anonymous positional placeholder.
/// Used by: SQLite, DuckDB
pub fn placeholder_question(_index: usize) -> String {
    "?".into()
}

/// Numbered placeholder, 1-based.
/// Used by: Postgres
pub fn placeholder_dollar(index: usize) -> String {
    format!("${}", index)
}

// =============================================================================
// Data Types
// =============================================================================

/// SQLite storage classes. Untyped columns get BLOB (no affinity).
pub fn emit_data_type_sqlite(ty: &ColumnType) -> &'static str {
    match ty {
        ColumnType::Integer | ColumnType::Year => "INTEGER",
        ColumnType::Decimal => "REAL",
        ColumnType::Text => "TEXT",
        ColumnType::Any => "BLOB",
    }
}

/// Emit data type for ANSI/Postgres style.
/// Used by: Postgres
pub fn emit_data_type_ansi(ty: &ColumnType) -> &'static str {
    match ty {
        ColumnType::Integer => "BIGINT",
        ColumnType::Year => "INTEGER",
        ColumnType::Decimal => "DOUBLE PRECISION",
        ColumnType::Text | ColumnType::Any => "TEXT",
    }
}

/// Emit data type for DuckDB.
pub fn emit_data_type_duckdb(ty: &ColumnType) -> &'static str {
    match ty {
        ColumnType::Integer => "BIGINT",
        ColumnType::Year => "INTEGER",
        ColumnType::Decimal => "DOUBLE",
        ColumnType::Text | ColumnType::Any => "VARCHAR",
    }
}
