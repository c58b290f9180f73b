//! The insurance agency performance schema.
//!
//! Fixed definitions shared by the load pipeline and the query service: the
//! dimension specs applied to the raw extract, the parameter catalog, and the
//! three base statements callers filter.

use crate::catalog::{ParamResult, ParameterCatalog};
use crate::compose::RangeSpec;
use crate::model::DimensionSpec;
use crate::sql::{avg, count_star, sum, table_col, table_star, ExprExt, Query, SelectExpr, TableRef};

/// Fact table produced by normalization.
pub const FACT_TABLE: &str = "insurance";

/// Table receiving the raw, un-normalized extract.
pub const RAW_TABLE: &str = "agency_performance";

/// Parameters owned by the fact table.
pub const FACT_PARAMETERS: &[&str] = &[
    "AGENCY_ID",
    "STAT_PROFILE_DATE_YEAR",
    "AGENCY_APPOINTMENT_YEAR",
    "PL_START_YEAR",
    "PL_END_YEAR",
    "COMMISIONS_START_YEAR",
    "COMMISIONS_END_YEAR",
    "CL_START_YEAR",
    "CL_END_YEAR",
    "ACTIVITY_NOTES_START_YEAR",
    "ACTIVITY_NOTES_END_YEAR",
];

/// Parameters owned by a dimension table.
pub const DIMENSION_PARAMETERS: &[(&str, &str)] = &[
    ("PRIMARY_AGENCY_ID", "agency"),
    ("PROD_ABBR", "product"),
    ("PROD_LINE", "product"),
    ("STATE_ABBR", "state"),
    ("VENDOR", "vendor"),
];

/// Columns summed by the summary statement, in output order around the
/// averaged ratios.
const SUMMARY_SUMS_BEFORE_RATIOS: &[&str] = &[
    "RETENTION_POLY_QTY",
    "POLY_INFORCE_QTY",
    "PREV_POLY_INFORCE_QTY",
    "NB_WRTN_PREM_AMT",
    "WRTN_PREM_AMT",
    "PREV_WRTN_PREM_AMT",
    "PRD_ERND_PREM_AMT",
    "PRD_INCRD_LOSSES_AMT",
];

const SUMMARY_AVERAGES: &[&str] = &[
    "RETENTION_RATIO",
    "LOSS_RATIO",
    "LOSS_RATIO_3YR",
    "GROWTH_RATE_3YR",
];

const SUMMARY_SUMS_AFTER_RATIOS: &[&str] = &[
    "CL_BOUND_CT_MDS",
    "CL_QUO_CT_MDS",
    "CL_BOUND_CT_SBZ",
    "CL_QUO_CT_SBZ",
    "CL_QUO_CT_EQT",
    "PL_BOUND_CT_ELINKS",
    "PL_QUO_CT_ELINKS",
    "PL_BOUND_CT_PLRANK",
    "PL_QUO_CT_PLRANK",
    "PL_BOUND_CT_EQTTE",
    "PL_QUO_CT_EQTTE",
    "PL_BOUND_CT_APPLIED",
    "PL_QUO_CT_APPLIED",
    "PL_BOUND_CT_TRANSACTNOW",
    "PL_QUO_CT_TRANSACTNOW",
];

const REPORT_PREMIUMS: &[&str] = &[
    "NB_WRTN_PREM_AMT",
    "WRTN_PREM_AMT",
    "PREV_WRTN_PREM_AMT",
    "PRD_ERND_PREM_AMT",
];

/// Parameters the report accepts.
pub const REPORT_START_PARAM: &str = "PL_START_YEAR";
pub const REPORT_END_PARAM: &str = "PL_END_YEAR";

const FACT_ALIAS: &str = "i";
const PRODUCT_ALIAS: &str = "p";

/// Dimension specs, in the order they are applied.
pub fn dimension_specs() -> Vec<DimensionSpec> {
    vec![
        DimensionSpec::new("agency", &["AGENCY_ID", "PRIMARY_AGENCY_ID"])
            .with_natural_key("AGENCY_ID")
            .with_drop_columns(&["PRIMARY_AGENCY_ID"]),
        DimensionSpec::new("product", &["PROD_ABBR", "PROD_LINE"]),
        DimensionSpec::new("state", &["STATE_ABBR"]),
        DimensionSpec::new("vendor", &["VENDOR"]),
    ]
}

/// The catalog of every filter parameter and its owning table.
pub fn parameter_catalog() -> ParamResult<ParameterCatalog> {
    let entries = FACT_PARAMETERS
        .iter()
        .map(|name| (*name, FACT_TABLE))
        .chain(DIMENSION_PARAMETERS.iter().copied());
    ParameterCatalog::from_entries(FACT_TABLE, entries)
}

/// `SELECT insurance.* FROM insurance`
pub fn detail_query() -> Query {
    Query::new()
        .select(vec![table_star(FACT_TABLE)])
        .from(TableRef::new(FACT_TABLE))
}

/// Row count, sums and ratio averages over the fact table.
pub fn summary_query() -> Query {
    let sums = |columns: &'static [&'static str]| {
        columns.iter().map(|column| {
            sum(table_col(FACT_TABLE, column)).alias(&format!("{column}_SUM"))
        })
    };

    let select: Vec<SelectExpr> = std::iter::once(count_star().alias("RESULTS_COUNT"))
        .chain(sums(SUMMARY_SUMS_BEFORE_RATIOS))
        .chain(SUMMARY_AVERAGES.iter().map(|column| {
            avg(table_col(FACT_TABLE, column)).alias(&format!("{column}_AVG"))
        }))
        .chain(sums(SUMMARY_SUMS_AFTER_RATIOS))
        .collect();

    Query::new().select(select).from(TableRef::new(FACT_TABLE))
}

/// Premium totals per agency and product line.
pub fn report_query() -> Query {
    let mut select = vec![
        table_col(FACT_ALIAS, "AGENCY_ID").alias("agency_id"),
        table_col(PRODUCT_ALIAS, "PROD_LINE").alias("product_line"),
    ];
    select.extend(REPORT_PREMIUMS.iter().map(|column| {
        sum(table_col(FACT_ALIAS, column)).alias(&format!("{}_sum", column.to_lowercase()))
    }));

    Query::new()
        .select(select)
        .from(TableRef::new(FACT_TABLE).with_alias(FACT_ALIAS))
        .inner_join(
            TableRef::new("product").with_alias(PRODUCT_ALIAS),
            table_col(PRODUCT_ALIAS, "id").eq(table_col(FACT_ALIAS, "PRODUCT_ID")),
        )
        .group_by(vec![
            table_col(FACT_ALIAS, "AGENCY_ID"),
            table_col(PRODUCT_ALIAS, "PROD_LINE"),
        ])
}

/// Inclusive plan-year range accepted by the report.
pub fn report_range() -> RangeSpec {
    RangeSpec::new(FACT_ALIAS, REPORT_START_PARAM, REPORT_END_PARAM)
}
