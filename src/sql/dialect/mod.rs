//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting
//! - Parameter placeholders: `?` (SQLite/DuckDB) vs `$n` (Postgres)
//! - Column type names for DDL
//!
//! # Usage
//!
//! ```ignore
//! use starschema::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("insurance");  // "insurance"
//! let slot = dialect.placeholder(2);                   // $2
//! ```

mod duckdb;
pub mod helpers;
mod postgres;
mod sqlite;

pub use duckdb::DuckDb;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use std::str::FromStr;

use crate::dataset::ColumnType;

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal, doubling embedded single quotes.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Placeholder text for the `index`-th bound parameter (1-based).
    fn placeholder(&self, index: usize) -> String;

    // =========================================================================
    // DDL Support
    // =========================================================================

    /// Column type name for DDL.
    fn emit_data_type(&self, ty: &ColumnType) -> &'static str;

    /// Whether this dialect supports IF NOT EXISTS for CREATE statements.
    fn supports_if_not_exists(&self) -> bool {
        true
    }

    /// Whether this dialect supports IF EXISTS for DROP statements.
    fn supports_if_exists(&self) -> bool {
        true
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
    DuckDb,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Sqlite => &Sqlite,
            Dialect::Postgres => &Postgres,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn placeholder(&self, index: usize) -> String {
        self.dialect().placeholder(index)
    }

    fn emit_data_type(&self, ty: &ColumnType) -> &'static str {
        self.dialect().emit_data_type(ty)
    }

    fn supports_if_not_exists(&self) -> bool {
        self.dialect().supports_if_not_exists()
    }

    fn supports_if_exists(&self) -> bool {
        self.dialect().supports_if_exists()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

/// Error returned when parsing an unknown dialect name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported dialect: {0}")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "duckdb" => Ok(Dialect::DuckDb),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}
