//! Star schema model types.
//!
//! The names fixed here are the contract between normalization and query
//! composition: every dimension's key column is [`SURROGATE_KEY`], and the
//! fact references it through [`foreign_key_column`].

mod dimension;

pub use dimension::{foreign_key_column, DimensionSpec, DimensionTable};

use crate::dataset::Dataset;

/// Key column of every dimension table.
pub const SURROGATE_KEY: &str = "id";

/// One fact table plus its dimensions, in the order they were extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSchema {
    pub fact: Dataset,
    pub dimensions: Vec<DimensionTable>,
}

impl StarSchema {
    pub fn dimension(&self, name: &str) -> Option<&DimensionTable> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.name.as_str())
    }
}
