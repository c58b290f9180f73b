//! In-memory tabular datasets.
//!
//! A [`Dataset`] is an ordered list of named, typed columns plus ordered rows.
//! Every row carries exactly one [`Value`] per column (possibly [`Value::Null`]).
//! Datasets are never mutated in place: every operation in [`ops`] returns a
//! new dataset, leaving the receiver untouched.
//!
//! ```ignore
//! use starschema::dataset::{Column, ColumnType, Dataset, Value};
//!
//! let ds = Dataset::from_rows(
//!     vec![Column::new("PROD_ABBR", ColumnType::Text)],
//!     vec![vec![Value::from("AU")], vec![Value::from("HO")]],
//! )?;
//! assert_eq!(ds.len(), 2);
//! ```

mod ops;

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

/// Errors raised by dataset construction and operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    #[error("Unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("Duplicate column: {column}")]
    DuplicateColumn { column: String },

    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' has {found} values, dataset has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} matched {matches} rows in lookup, expected at most one")]
    AmbiguousMatch { row: usize, matches: usize },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

// =============================================================================
// Values
// =============================================================================

/// A single cell value.
///
/// Floats compare and hash by bit pattern so that datasets can be
/// deduplicated and used as join keys.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Int(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    /// Renders the value as plain text. Nulls render as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => {
                let mut buffer = ryu::Buffer::new();
                f.write_str(buffer.format(*x))
            }
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Semantic column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Decimal,
    Text,
    /// Four-digit calendar year stored as an integer.
    Year,
    /// Untyped or all-null column.
    #[default]
    Any,
}

impl ColumnType {
    /// Whether a value is representable in a column of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (ColumnType::Any, _) => true,
            (ColumnType::Integer | ColumnType::Year, Value::Int(_)) => true,
            (ColumnType::Decimal, Value::Int(_) | Value::Float(_)) => true,
            (ColumnType::Text, Value::Text(_)) => true,
            _ => false,
        }
    }

    /// Narrowest type holding every value: integers widen to decimals, any
    /// text makes the column text, and an all-null column stays [`Any`].
    ///
    /// [`Any`]: ColumnType::Any
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        values
            .into_iter()
            .fold(ColumnType::Any, |acc, value| match (acc, value) {
                (acc, Value::Null) => acc,
                (ColumnType::Text, _) | (_, Value::Text(_)) => ColumnType::Text,
                (ColumnType::Decimal, _) | (_, Value::Float(_)) => ColumnType::Decimal,
                (_, Value::Int(_)) => ColumnType::Integer,
            })
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// An immutable in-memory table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new(columns: Vec<Column>) -> DatasetResult<Self> {
        Self::from_rows(columns, Vec::new())
    }

    /// Create a dataset from columns and rows.
    ///
    /// Fails if two columns share a name or a row's width differs from the
    /// column count.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> DatasetResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
        }

        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(DatasetError::RowWidth {
                row,
                expected: columns.len(),
                found: values.len(),
            });
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Like [`Dataset::column_index`], but missing columns are an error.
    pub fn require_column(&self, name: &str) -> DatasetResult<usize> {
        self.column_index(name)
            .ok_or_else(|| DatasetError::UnknownColumn {
                column: name.to_string(),
            })
    }

    /// Values of a single column, in row order.
    pub fn column_values(&self, name: &str) -> DatasetResult<Vec<&Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Value at `row` in column `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|values| &values[idx])
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

impl Serialize for Dataset {
    /// Serializes as a list of records, one map per row, keyed by column name
    /// in column order.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                columns: &self.columns,
                values: row,
            })?;
        }
        seq.end()
    }
}

struct Record<'a> {
    columns: &'a [Column],
    values: &'a [Value],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(&column.name, value)?;
        }
        map.end()
    }
}
