//! Persistence and execution boundary.
//!
//! The core never talks to a database directly. Everything it needs goes
//! through [`Store`]: run a bound statement and get a dataset back, or write
//! a dataset into a named table.

mod sqlite;

pub use sqlite::SqliteStore;

use std::fmt;

use crate::dataset::{Dataset, DatasetError};
use crate::sql::{BoundStatement, Dialect};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Statement rendered for {found}, store expects {expected}")]
    DialectMismatch { expected: Dialect, found: Dialect },

    #[error("Cannot create table '{table}' without columns")]
    NoColumns { table: String },

    /// SQLite would silently assign a rowid to a NULL integer primary key.
    #[error("Table '{table}' row {row} has a null '{column}' primary key")]
    NullPrimaryKey {
        table: String,
        column: String,
        row: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How [`Store::write`] treats an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop any existing table and recreate it from the dataset's columns.
    Replace,
    /// Create the table if missing, then add rows.
    Append,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Replace => write!(f, "replace"),
            WriteMode::Append => write!(f, "append"),
        }
    }
}

/// A relational store the query service and load pipeline run against.
pub trait Store {
    /// Dialect statements must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Run a statement and collect every result row.
    fn execute(&self, statement: &BoundStatement) -> StoreResult<Dataset>;

    /// Write `data` into `table`. Returns the number of rows written.
    fn write(&mut self, data: &Dataset, table: &str, mode: WriteMode) -> StoreResult<usize>;
}
