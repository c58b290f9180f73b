//! Load pipeline: raw extract in, star schema out.
//!
//! 1. replace NaN decimals with nulls;
//! 2. normalize with the agency dimension specs;
//! 3. append the raw dataset to the raw table;
//! 4. number the fact rows (`id`, 1-based);
//! 5. replace-write the fact table and every dimension.

use serde::Serialize;
use tracing::{info, info_span};

use crate::agency;
use crate::dataset::Dataset;
use crate::model::{DimensionSpec, SURROGATE_KEY};
use crate::normalize::{normalize, NormalizeError};
use crate::store::{Store, StoreError, WriteMode};

/// Errors raised while loading.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Where a load writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTarget {
    /// Raw table, appended to. `None` skips the raw copy.
    pub raw_table: Option<String>,
    pub fact_table: String,
    pub specs: Vec<DimensionSpec>,
}

impl Default for LoadTarget {
    fn default() -> Self {
        Self {
            raw_table: Some(agency::RAW_TABLE.to_string()),
            fact_table: agency::FACT_TABLE.to_string(),
            specs: agency::dimension_specs(),
        }
    }
}

/// Rows written per table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub raw_rows: usize,
    pub fact_rows: usize,
    pub dimensions: Vec<(String, usize)>,
}

/// Load `raw` into `store`.
///
/// Normalization runs before any star-schema table is touched, so a
/// configuration error leaves the existing star schema in place.
pub fn load<S: Store>(store: &mut S, raw: &Dataset, target: &LoadTarget) -> PipelineResult<LoadSummary> {
    let span = info_span!("load", rows = raw.len(), fact = target.fact_table.as_str());
    let _guard = span.enter();

    let raw = raw.nulls_normalized();
    let schema = normalize(&raw, &target.specs)?;

    let raw_rows = match &target.raw_table {
        Some(table) => store.write(&raw, table, WriteMode::Append)?,
        None => 0,
    };

    let fact = schema
        .fact
        .with_row_ids(SURROGATE_KEY)
        .map_err(NormalizeError::from)?;
    let fact_rows = store.write(&fact, &target.fact_table, WriteMode::Replace)?;

    let dimensions = schema
        .dimensions
        .iter()
        .map(|dim| {
            let rows = store.write(&dim.data, &dim.name, WriteMode::Replace)?;
            Ok((dim.name.clone(), rows))
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    info!(raw_rows, fact_rows, dimensions = dimensions.len(), "Load complete");
    Ok(LoadSummary {
        raw_rows,
        fact_rows,
        dimensions,
    })
}
