//! The query surface: detail, summary and report over a [`Store`].
//!
//! Every request validates its parameters before composing SQL, and composes
//! SQL before touching the store. Parameter problems surface as
//! [`ServiceError::Param`] with a client-facing message; store failures pass
//! through unchanged.

use serde::Serialize;
use tracing::{info, info_span};

use crate::agency;
use crate::catalog::{AcceptedParams, FilterParams, ParamError, ParameterCatalog};
use crate::compose::{QueryComposer, RangeSpec};
use crate::dataset::Dataset;
use crate::sql::{BoundStatement, Dialect, Query};
use crate::store::{Store, StoreError};

/// Errors returned by [`QueryService`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// HTTP-style status for transport layers.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Param(_) => 422,
            ServiceError::Store(_) => 500,
        }
    }

    /// `{"message": ...}` payload.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error payload returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Result of a detail or summary request: the parameters as received and
/// the matching rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub params: FilterParams,
    pub data: Dataset,
}

/// Which statement a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Detail,
    Summary,
    Report,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Detail => "detail",
            Endpoint::Summary => "summary",
            Endpoint::Report => "report",
        }
    }
}

/// Turns a request into the statement it runs, without running it.
#[derive(Debug, Clone)]
pub struct RequestPlanner {
    composer: QueryComposer,
    report_params: AcceptedParams,
    report_range: RangeSpec,
    detail: Query,
    summary: Query,
    report: Query,
}

impl RequestPlanner {
    /// Planner over the fixed agency catalog.
    pub fn new(dialect: Dialect) -> ServiceResult<Self> {
        Self::with_catalog(agency::parameter_catalog()?, dialect)
    }

    pub fn with_catalog(catalog: ParameterCatalog, dialect: Dialect) -> ServiceResult<Self> {
        let report_params =
            catalog.accepting(&[agency::REPORT_START_PARAM, agency::REPORT_END_PARAM])?;
        Ok(Self {
            composer: QueryComposer::new(catalog, dialect),
            report_params,
            report_range: agency::report_range(),
            detail: agency::detail_query(),
            summary: agency::summary_query(),
            report: agency::report_query(),
        })
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        self.composer.catalog()
    }

    /// Validate `params` and compose the endpoint's statement.
    pub fn plan(&self, endpoint: Endpoint, params: &FilterParams) -> ServiceResult<BoundStatement> {
        let statement = match endpoint {
            Endpoint::Detail => self.composer.compose(&self.detail, params)?,
            Endpoint::Summary => self.composer.compose(&self.summary, params)?,
            Endpoint::Report => {
                self.report_params.validate(params.names())?;
                self.composer
                    .compose_range(&self.report, params, &self.report_range)?
            }
        };
        Ok(statement)
    }
}

/// Serves filtered queries over the agency star schema.
pub struct QueryService<S> {
    store: S,
    planner: RequestPlanner,
}

impl<S: Store> QueryService<S> {
    /// Service over the fixed agency catalog.
    pub fn new(store: S) -> ServiceResult<Self> {
        let planner = RequestPlanner::new(store.dialect())?;
        Ok(Self { store, planner })
    }

    pub fn with_catalog(store: S, catalog: ParameterCatalog) -> ServiceResult<Self> {
        let planner = RequestPlanner::with_catalog(catalog, store.dialect())?;
        Ok(Self { store, planner })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn planner(&self) -> &RequestPlanner {
        &self.planner
    }

    /// Every fact row matching the filters.
    pub fn detail(&self, params: &FilterParams) -> ServiceResult<QueryResponse> {
        self.respond(Endpoint::Detail, params)
    }

    /// Count, sums and ratio averages over the matching fact rows.
    pub fn summary(&self, params: &FilterParams) -> ServiceResult<QueryResponse> {
        self.respond(Endpoint::Summary, params)
    }

    /// Premium totals per agency and product line, optionally limited to an
    /// inclusive plan-year range.
    pub fn report(&self, params: &FilterParams) -> ServiceResult<Dataset> {
        self.run(Endpoint::Report, params)
    }

    fn respond(&self, endpoint: Endpoint, params: &FilterParams) -> ServiceResult<QueryResponse> {
        let data = self.run(endpoint, params)?;
        Ok(QueryResponse {
            params: params.clone(),
            data,
        })
    }

    fn run(&self, endpoint: Endpoint, params: &FilterParams) -> ServiceResult<Dataset> {
        let span = info_span!("request", endpoint = endpoint.name(), params = params.len());
        let _guard = span.enter();

        let statement = self.planner.plan(endpoint, params)?;
        let data = self.store.execute(&statement)?;
        info!(rows = data.len(), "Request served");
        Ok(data)
    }
}
