//! Wide-table to star-schema normalization.
//!
//! [`normalize`] folds an ordered list of [`DimensionSpec`]s over a wide
//! dataset. Each step sees the fact table as the previous step left it,
//! extracts one dimension, and returns the slimmer fact. The caller's dataset
//! is never modified, and a failing step aborts the whole run.
//!
//! Key assignment for specs without a natural key is dense, 1-based and in
//! first-seen order of the distinct identity tuples (stable by original row
//! index), so re-running on the same input yields the same keys.

use std::collections::HashMap;

use tracing::{debug, info, info_span};

use crate::dataset::{Column, ColumnType, Dataset, DatasetError, Value};
use crate::model::{DimensionSpec, DimensionTable, StarSchema, SURROGATE_KEY};

/// Errors raised while normalizing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// A spec names a column the fact table does not have at that step.
    #[error("Dimension '{table}' references column '{column}', which is not in the fact table")]
    SchemaConfiguration { table: String, column: String },

    /// The generated foreign key column would overwrite an existing fact column.
    #[error("Dimension '{table}' foreign key column '{column}' already exists in the fact table")]
    ForeignKeyConflict { table: String, column: String },

    /// A natural key is null on some fact row, so that row has no dimension
    /// row to point at.
    #[error("Dimension '{table}' natural key is null in fact row {row}")]
    NullNaturalKey { table: String, row: usize },

    /// A fact row resolved to more than one dimension row.
    #[error("Fact row {row} matched {matches} rows of dimension '{table}'")]
    JoinCardinalityViolation {
        table: String,
        row: usize,
        matches: usize,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result of extracting a single dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub fact: Dataset,
    pub dimension: DimensionTable,
}

/// Decompose `wide` into a fact table plus one dimension per spec.
pub fn normalize(wide: &Dataset, specs: &[DimensionSpec]) -> NormalizeResult<StarSchema> {
    let span = info_span!("normalize", rows = wide.len(), dimensions = specs.len());
    let _guard = span.enter();

    let (fact, dimensions) = specs.iter().try_fold(
        (wide.clone(), Vec::with_capacity(specs.len())),
        |(fact, mut dimensions), spec| {
            let step = apply_dimension(&fact, spec)?;
            dimensions.push(step.dimension);
            Ok::<_, NormalizeError>((step.fact, dimensions))
        },
    )?;

    info!(
        fact_columns = fact.width(),
        fact_rows = fact.len(),
        dimensions = dimensions.len(),
        "Normalization complete"
    );

    Ok(StarSchema { fact, dimensions })
}

/// Extract one dimension from `fact`.
pub fn apply_dimension(fact: &Dataset, spec: &DimensionSpec) -> NormalizeResult<Extraction> {
    validate_spec(fact, spec)?;

    let distinct = fact.project(&spec.source_columns)?.distinct();

    let (dimension, fact) = match &spec.natural_key {
        Some(key) => {
            check_natural_key_present(fact, spec, key)?;
            check_natural_key_unique(fact, &distinct, spec, key)?;
            let dimension = distinct.rename_column(key, SURROGATE_KEY)?;
            (dimension, fact.clone())
        }
        None => {
            let keys = (1..=distinct.len() as i64).map(Value::Int).collect();
            let dimension = distinct.with_column_at(
                0,
                Column::new(SURROGATE_KEY, ColumnType::Integer),
                keys,
            )?;

            let foreign_keys = fact
                .lookup(&spec.source_columns, &dimension, SURROGATE_KEY)
                .map_err(|err| cardinality_error(err, &spec.table))?;
            let fact = fact.with_column(
                Column::new(spec.foreign_key_column(), ColumnType::Integer),
                foreign_keys,
            )?;
            (dimension, fact)
        }
    };

    let fact = fact.drop_columns(spec.columns_to_drop())?;

    debug!(
        table = spec.table.as_str(),
        rows = dimension.len(),
        natural_key = spec.natural_key.is_some(),
        "Dimension extracted"
    );

    Ok(Extraction {
        fact,
        dimension: DimensionTable {
            name: spec.table.clone(),
            data: dimension,
        },
    })
}

/// Every referenced column must exist before anything is computed.
fn validate_spec(fact: &Dataset, spec: &DimensionSpec) -> NormalizeResult<()> {
    let referenced = spec
        .source_columns
        .iter()
        .chain(spec.natural_key.iter())
        .chain(spec.columns_to_drop().iter());

    for column in referenced {
        if !fact.has_column(column) {
            return Err(NormalizeError::SchemaConfiguration {
                table: spec.table.clone(),
                column: column.clone(),
            });
        }
    }

    if let Some(key) = &spec.natural_key {
        if !spec.source_columns.contains(key) {
            return Err(NormalizeError::SchemaConfiguration {
                table: spec.table.clone(),
                column: key.clone(),
            });
        }
    } else {
        let fk = spec.foreign_key_column();
        if fact.has_column(&fk) {
            return Err(NormalizeError::ForeignKeyConflict {
                table: spec.table.clone(),
                column: fk,
            });
        }
    }

    Ok(())
}

fn check_natural_key_present(fact: &Dataset, spec: &DimensionSpec, key: &str) -> NormalizeResult<()> {
    match fact.column_values(key)?.into_iter().position(Value::is_null) {
        Some(row) => Err(NormalizeError::NullNaturalKey {
            table: spec.table.clone(),
            row,
        }),
        None => Ok(()),
    }
}

/// A natural key shared by two distinct identity tuples would make the fact's
/// key column point at two dimension rows.
fn check_natural_key_unique(
    fact: &Dataset,
    distinct: &Dataset,
    spec: &DimensionSpec,
    key: &str,
) -> NormalizeResult<()> {
    let mut counts: HashMap<&Value, usize> = HashMap::with_capacity(distinct.len());
    for value in distinct.column_values(key)? {
        *counts.entry(value).or_default() += 1;
    }

    let offending = fact
        .column_values(key)?
        .into_iter()
        .enumerate()
        .find_map(|(row, value)| match counts.get(value) {
            Some(&matches) if matches > 1 => Some((row, matches)),
            _ => None,
        });

    match offending {
        Some((row, matches)) => Err(NormalizeError::JoinCardinalityViolation {
            table: spec.table.clone(),
            row,
            matches,
        }),
        None => Ok(()),
    }
}

fn cardinality_error(err: DatasetError, table: &str) -> NormalizeError {
    match err {
        DatasetError::AmbiguousMatch { row, matches } => NormalizeError::JoinCardinalityViolation {
            table: table.to_string(),
            row,
            matches,
        },
        other => other.into(),
    }
}
