//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible in quoting, but accepts anonymous `?`
//! placeholders.

use super::helpers;
use super::SqlDialect;
use crate::dataset::ColumnType;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_question(index)
    }

    fn emit_data_type(&self, ty: &ColumnType) -> &'static str {
        helpers::emit_data_type_duckdb(ty)
    }
}
