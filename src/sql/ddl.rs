//! DDL (Data Definition Language) support.
//!
//! Builders for the CREATE TABLE / DROP TABLE statements the store issues
//! when materializing datasets.
//!
//! # Examples
//!
//! ```ignore
//! use starschema::sql::ddl::{ColumnDef, CreateTable};
//! use starschema::dataset::ColumnType;
//! use starschema::sql::Dialect;
//!
//! let table = CreateTable::new("vendor")
//!     .column(ColumnDef::new("id", ColumnType::Integer))
//!     .column(ColumnDef::new("VENDOR", ColumnType::Text));
//!
//! println!("{}", table.to_sql(Dialect::Sqlite));
//! ```

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};
use crate::dataset::{Column, ColumnType};

// ============================================================================
// CREATE TABLE
// ============================================================================

/// CREATE TABLE statement.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTable {
    pub if_not_exists: bool,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl CreateTable {
    /// Create a new CREATE TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_not_exists: false,
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add IF NOT EXISTS clause.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Add a column definition.
    pub fn column(mut self, col: ColumnDef) -> Self {
        self.columns.push(col);
        self
    }

    /// Add multiple column definitions.
    pub fn columns(mut self, cols: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(cols);
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Create).space().push(Token::Table);

        if self.if_not_exists && dialect.supports_if_not_exists() {
            ts.space()
                .push(Token::If)
                .space()
                .push(Token::Not)
                .space()
                .push(Token::Exists);
        }

        ts.space().push(Token::Ident(self.name.clone()));

        ts.space().lparen();
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&col.to_tokens(dialect));
        }
        ts.rparen();

        ts
    }
}

/// Column definition for CREATE TABLE.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: ColumnType,
    pub primary_key: bool,
}

impl ColumnDef {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
        }
    }

    /// Add PRIMARY KEY constraint.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.name.clone()))
            .space()
            .push(Token::TypeName(dialect.emit_data_type(&self.data_type)));
        if self.primary_key {
            ts.space().push(Token::Primary).space().push(Token::Key);
        }
        ts
    }
}

impl From<&Column> for ColumnDef {
    fn from(column: &Column) -> Self {
        ColumnDef::new(column.name.clone(), column.column_type)
    }
}

// ============================================================================
// DROP TABLE
// ============================================================================

/// DROP TABLE statement.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct DropTable {
    pub name: String,
    pub if_exists: bool,
}

impl DropTable {
    /// Create a new DROP TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            if_exists: false,
        }
    }

    /// Add IF EXISTS clause.
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Drop).space().push(Token::Table);

        if self.if_exists && dialect.supports_if_exists() {
            ts.space().push(Token::If).space().push(Token::Exists);
        }

        ts.space().push(Token::Ident(self.name.clone()));
        ts
    }
}
