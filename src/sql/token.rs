//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings.

use super::dialect::{Dialect, SqlDialect};
use super::statement::BoundStatement;
use crate::dataset::Value;

/// SQL Token - every element the builders emit.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    Not,
    As,
    On,
    Join,
    Inner,
    GroupBy,

    // === DDL / DML Keywords ===
    Create,
    Drop,
    Table,
    Primary,
    Key,
    If,
    Exists,
    Insert,
    Into,
    Values,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    Semicolon,

    // === Operators ===
    Eq,
    Lte,
    Gte,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Simple identifier (table, column, alias)
    Ident(String),
    /// Caller-supplied value. Bound as a placeholder by [`TokenStream::bind`],
    /// inlined as an escaped literal by [`TokenStream::serialize`].
    Param(Value),
    /// Function name, rendered upper-case
    FunctionName(String),
    /// Column type name in DDL, rendered as-is
    TypeName(&'static str),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::Not => "NOT".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::GroupBy => "GROUP BY".into(),

            // DDL / DML keywords
            Token::Create => "CREATE".into(),
            Token::Drop => "DROP".into(),
            Token::Table => "TABLE".into(),
            Token::Primary => "PRIMARY".into(),
            Token::Key => "KEY".into(),
            Token::If => "IF".into(),
            Token::Exists => "EXISTS".into(),
            Token::Insert => "INSERT".into(),
            Token::Into => "INTO".into(),
            Token::Values => "VALUES".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Semicolon => ";".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            // Dynamic - dialect-specific formatting
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::Param(value) => inline_value(value, dialect),

            Token::FunctionName(name) => name.to_uppercase(),
            Token::TypeName(name) => (*name).into(),
        }
    }
}

/// Non-finite floats have no SQL literal form and render as NULL.
fn format_float(f: f64, dialect: Dialect) -> String {
    if !f.is_finite() {
        return dialect.format_null().into();
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format(f).to_string()
}

fn inline_value(value: &Value, dialect: Dialect) -> String {
    match value {
        Value::Null => dialect.format_null().into(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => format_float(*f, dialect),
        Value::Text(s) => dialect.quote_string(s),
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Serialize all tokens to a SQL string, inlining parameter values as
    /// escaped literals.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    /// Serialize to SQL with every [`Token::Param`] replaced by the dialect's
    /// placeholder. The values are returned alongside, in placeholder order.
    pub fn bind(&self, dialect: Dialect) -> BoundStatement {
        BoundStatement::from_tokens(self.clone(), dialect)
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
