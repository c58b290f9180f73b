//! Rendered statements with their bound parameter values.

use std::fmt;

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};
use crate::dataset::Value;

/// A SQL statement ready for execution.
///
/// `sql` contains dialect placeholders in place of every caller-supplied
/// value; `params` holds those values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<Value>,
    dialect: Dialect,
    tokens: TokenStream,
}

impl BoundStatement {
    /// Render a token stream, replacing parameter tokens with placeholders.
    pub fn from_tokens(tokens: TokenStream, dialect: Dialect) -> Self {
        let mut sql = String::new();
        let mut params = Vec::new();
        for token in tokens.tokens() {
            match token {
                Token::Param(value) => {
                    params.push(value.clone());
                    sql.push_str(&dialect.placeholder(params.len()));
                }
                other => sql.push_str(&other.serialize(dialect)),
            }
        }
        Self {
            sql,
            params,
            dialect,
            tokens,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The statement with every parameter inlined as an escaped literal.
    ///
    /// For diagnostics only; execution always goes through `sql` + `params`.
    pub fn interpolated(&self) -> String {
        self.tokens.serialize(self.dialect)
    }
}

impl fmt::Display for BoundStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
