// src/model/dimension.rs
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// How one dimension table is carved out of the fact table.
///
/// `source_columns` are the identity attributes copied into the dimension.
/// With a `natural_key`, that column becomes the dimension's `id` and the
/// fact keeps its own copy as the foreign key. Without one, dense keys are
/// generated and written back to the fact as `<TABLE>_ID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub table: String,
    pub source_columns: Vec<String>,
    #[serde(default)]
    pub natural_key: Option<String>,
    /// Fact columns removed after extraction (defaults to `source_columns`)
    #[serde(default)]
    pub drop_columns: Option<Vec<String>>,
}

impl DimensionSpec {
    pub fn new(table: &str, source_columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            source_columns: source_columns.iter().map(|c| c.to_string()).collect(),
            natural_key: None,
            drop_columns: None,
        }
    }

    pub fn with_natural_key(mut self, column: &str) -> Self {
        self.natural_key = Some(column.into());
        self
    }

    pub fn with_drop_columns(mut self, columns: &[&str]) -> Self {
        self.drop_columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Fact column holding the foreign key into this dimension.
    pub fn foreign_key_column(&self) -> String {
        foreign_key_column(&self.table)
    }

    pub fn columns_to_drop(&self) -> &[String] {
        self.drop_columns.as_deref().unwrap_or(&self.source_columns)
    }
}

/// `<TABLE_NAME_UPPER>_ID`
pub fn foreign_key_column(table: &str) -> String {
    format!("{}_ID", table.to_uppercase())
}

/// A materialized dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionTable {
    pub name: String,
    pub data: Dataset,
}
