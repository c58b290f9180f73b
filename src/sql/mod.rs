//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect SQL.
//! It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`ddl`] - CREATE TABLE / DROP TABLE
//! - [`dml`] - INSERT
//! - [`statement`] - rendered statements with bound parameter values
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod query;
pub mod statement;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect, UnknownDialect};
pub use expr::{
    avg, col, count_star, param, star, sum, table_col, table_star, BinaryOperator, Expr, ExprExt,
};
pub use query::{Join, Query, SelectExpr, TableRef};
pub use statement::BoundStatement;
pub use token::{Token, TokenStream};

pub use ddl::{ColumnDef, CreateTable, DropTable};
pub use dml::Insert;
