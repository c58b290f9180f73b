use starschema::catalog::FilterParams;
use starschema::dataset::{Dataset, Value};
use starschema::export::to_csv_string;
use starschema::ingest::read_csv;
use starschema::pipeline::{load, LoadTarget};
use starschema::service::{QueryService, ServiceError};
use starschema::store::{SqliteStore, Store};

const IDENTITY: &[&str] = &[
    "AGENCY_ID",
    "PRIMARY_AGENCY_ID",
    "PROD_ABBR",
    "PROD_LINE",
    "STATE_ABBR",
    "VENDOR",
    "STAT_PROFILE_DATE_YEAR",
    "PL_START_YEAR",
    "PL_END_YEAR",
];

const MEASURES: &[&str] = &[
    "RETENTION_POLY_QTY",
    "POLY_INFORCE_QTY",
    "PREV_POLY_INFORCE_QTY",
    "NB_WRTN_PREM_AMT",
    "WRTN_PREM_AMT",
    "PREV_WRTN_PREM_AMT",
    "PRD_ERND_PREM_AMT",
    "PRD_INCRD_LOSSES_AMT",
    "RETENTION_RATIO",
    "LOSS_RATIO",
    "LOSS_RATIO_3YR",
    "GROWTH_RATE_3YR",
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

/// Four agency rows; every measure on a row carries the same value.
fn raw_extract() -> Dataset {
    let rows: [(&str, u32); 4] = [
        ("3,3,CPP,CL,OH,NA,2010,2008,2012", 10),
        ("3,3,HO,PL,OH,Applied,2011,2010,2014", 20),
        ("7,3,CPP,CL,PA,NA,2010,2011,2015", 30),
        ("7,3,HO,PL,PA,Applied,2012,2013,2016", 40),
    ];

    let mut csv = IDENTITY
        .iter()
        .chain(MEASURES)
        .copied()
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');
    for (identity, measure) in rows {
        csv.push_str(identity);
        for _ in MEASURES {
            csv.push_str(&format!(",{measure}"));
        }
        csv.push('\n');
    }

    read_csv(csv.as_bytes()).unwrap()
}

fn service() -> QueryService<SqliteStore> {
    let mut store = SqliteStore::open_in_memory().unwrap();
    load(&mut store, &raw_extract(), &LoadTarget::default()).unwrap();
    QueryService::new(store).unwrap()
}

fn column(data: &Dataset, name: &str) -> Vec<Value> {
    let mut values: Vec<Value> = data
        .column_values(name)
        .unwrap()
        .into_iter()
        .cloned()
        .collect();
    values.sort_by_key(|v| v.to_string());
    values
}

#[test]
fn test_detail_without_params_returns_every_fact_row() {
    let response = service().detail(&FilterParams::new()).unwrap();
    assert_eq!(response.data.len(), 4);
    assert!(response.params.is_empty());
    assert!(response.data.has_column("PRODUCT_ID"));
    assert!(!response.data.has_column("PROD_LINE"));
}

#[test]
fn test_detail_filters_through_dimension() {
    let params = FilterParams::new().with("PROD_LINE", "PL");
    let response = service().detail(&params).unwrap();

    assert_eq!(response.params, params);
    assert_eq!(
        column(&response.data, "WRTN_PREM_AMT"),
        vec![Value::Int(20), Value::Int(40)]
    );
}

#[test]
fn test_detail_combines_dimension_filters() {
    let params = FilterParams::new()
        .with("VENDOR", "Applied")
        .with("STATE_ABBR", "PA");
    let response = service().detail(&params).unwrap();

    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data.value(0, "AGENCY_ID"), Some(&Value::Int(7)));
}

#[test]
fn test_detail_fact_parameter_uses_affinity() {
    let params = FilterParams::new().with("AGENCY_ID", "3");
    let response = service().detail(&params).unwrap();
    assert_eq!(response.data.len(), 2);
}

#[test]
fn test_summary_aggregates() {
    let params = FilterParams::new().with("STATE_ABBR", "OH");
    let response = service().summary(&params).unwrap();
    let data = &response.data;

    assert_eq!(data.len(), 1);
    assert_eq!(data.width(), 28);
    assert_eq!(data.value(0, "RESULTS_COUNT"), Some(&Value::Int(2)));
    assert_eq!(data.value(0, "WRTN_PREM_AMT_SUM"), Some(&Value::Int(30)));
    assert_eq!(data.value(0, "LOSS_RATIO_AVG"), Some(&Value::Float(15.0)));
    assert_eq!(data.value(0, "PL_QUO_CT_TRANSACTNOW_SUM"), Some(&Value::Int(30)));
}

#[test]
fn test_summary_with_no_matches() {
    let params = FilterParams::new().with("VENDOR", "Nobody");
    let response = service().summary(&params).unwrap();

    assert_eq!(response.data.value(0, "RESULTS_COUNT"), Some(&Value::Int(0)));
    assert_eq!(response.data.value(0, "WRTN_PREM_AMT_SUM"), Some(&Value::Null));
}

#[test]
fn test_summary_json_shape() {
    let response = service()
        .summary(&FilterParams::new().with("PROD_ABBR", "HO"))
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["params"]["PROD_ABBR"], "HO");
    assert_eq!(json["data"][0]["RESULTS_COUNT"], 2);
    assert_eq!(json["data"][0]["NB_WRTN_PREM_AMT_SUM"], 60);
}

#[test]
fn test_report_groups_by_agency_and_line() {
    let report = service().report(&FilterParams::new()).unwrap();

    assert_eq!(
        report.column_names().collect::<Vec<_>>(),
        vec![
            "agency_id",
            "product_line",
            "nb_wrtn_prem_amt_sum",
            "wrtn_prem_amt_sum",
            "prev_wrtn_prem_amt_sum",
            "prd_ernd_prem_amt_sum",
        ]
    );
    assert_eq!(report.len(), 4);
}

#[test]
fn test_report_year_range() {
    let service = service();

    let from_2010 = service
        .report(&FilterParams::new().with("PL_START_YEAR", "2010"))
        .unwrap();
    assert_eq!(
        column(&from_2010, "wrtn_prem_amt_sum"),
        vec![Value::Int(20), Value::Int(30), Value::Int(40)]
    );

    let window = service
        .report(
            &FilterParams::new()
                .with("PL_START_YEAR", "2010")
                .with("PL_END_YEAR", "2015"),
        )
        .unwrap();
    assert_eq!(
        column(&window, "wrtn_prem_amt_sum"),
        vec![Value::Int(20), Value::Int(30)]
    );
}

#[test]
fn test_report_csv_has_no_index_column() {
    let report = service()
        .report(&FilterParams::new().with("PL_END_YEAR", "2012"))
        .unwrap();
    let csv = to_csv_string(&report).unwrap();

    assert_eq!(
        csv,
        "agency_id,product_line,nb_wrtn_prem_amt_sum,wrtn_prem_amt_sum,prev_wrtn_prem_amt_sum,prd_ernd_prem_amt_sum\n\
         3,CL,10,10,10,10\n"
    );
}

#[test]
fn test_parameter_errors_are_client_errors() {
    let service = service();

    let unknown = service
        .summary(&FilterParams::new().with("REGION", "west"))
        .unwrap_err();
    assert!(matches!(unknown, ServiceError::Param(_)));
    assert_eq!(unknown.status_code(), 422);
    assert_eq!(unknown.body().message, "Invalid parameter `REGION`.");

    let malformed = service
        .report(&FilterParams::new().with("PL_START_YEAR", "10"))
        .unwrap_err();
    assert_eq!(malformed.body().message, "PL_START_YEAR must follow the format YYYY");
}

#[test]
fn test_missing_tables_are_store_errors() {
    let service = QueryService::new(SqliteStore::open_in_memory().unwrap()).unwrap();
    let err = service.detail(&FilterParams::new()).unwrap_err();

    assert!(matches!(err, ServiceError::Store(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(service.store().dialect(), starschema::sql::Dialect::Sqlite);
}
