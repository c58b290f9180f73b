//! SQLite SQL dialect.
//!
//! SQLite features:
//! - ANSI identifier quoting (`"`)
//! - Anonymous `?` placeholders
//! - Dynamic typing with column affinity

use super::helpers;
use super::SqlDialect;
use crate::dataset::ColumnType;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_question(index)
    }

    fn emit_data_type(&self, ty: &ColumnType) -> &'static str {
        helpers::emit_data_type_sqlite(ty)
    }
}
