//! # starschema
//!
//! Star-schema normalization and parameter-driven SQL composition for
//! insurance agency performance data.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   raw extract (CSV / ZIP)    │
//! └──────────────────────────────┘
//!                │ [ingest]
//!                ▼
//! ┌──────────────────────────────┐
//! │   wide Dataset               │
//! └──────────────────────────────┘
//!                │ [normalize]  DimensionSpec fold
//!                ▼
//! ┌──────────────────────────────┐
//! │   StarSchema: fact + dims    │──── [store] write (replace / append)
//! └──────────────────────────────┘
//!
//! ┌──────────────────────────────┐
//! │   FilterParams               │
//! └──────────────────────────────┘
//!                │ [catalog] validate
//!                ▼
//! ┌──────────────────────────────┐
//! │   QueryComposer              │──── BoundStatement ──── [store] execute
//! └──────────────────────────────┘
//! ```
//!
//! The surrogate key column (`id`) and foreign key naming
//! (`<TABLE>_ID`) produced by [`normalize`] are exactly what [`compose`]
//! joins on.

pub mod agency;
pub mod catalog;
pub mod compose;
pub mod config;
pub mod dataset;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod service;
pub mod sql;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{AcceptedParams, FilterParams, ParamError, ParameterCatalog};
    pub use crate::compose::{compose_range, QueryComposer, RangeSpec};
    pub use crate::dataset::{Column, ColumnType, Dataset, DatasetError, Value};
    pub use crate::model::{DimensionSpec, DimensionTable, StarSchema, SURROGATE_KEY};
    pub use crate::normalize::{normalize, NormalizeError};
    pub use crate::pipeline::{load, LoadSummary, LoadTarget};
    pub use crate::service::{
        Endpoint, QueryResponse, QueryService, RequestPlanner, ServiceError,
    };
    pub use crate::sql::{BoundStatement, Dialect, Query, SqlDialect};
    pub use crate::store::{SqliteStore, Store, StoreError, WriteMode};
}
