use insta::assert_snapshot;
use sqlparser::dialect::{PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use starschema::agency;
use starschema::catalog::{FilterParams, ParamError};
use starschema::compose::QueryComposer;
use starschema::dataset::Value;
use starschema::sql::Dialect;

fn composer(dialect: Dialect) -> QueryComposer {
    QueryComposer::new(agency::parameter_catalog().unwrap(), dialect)
}

fn assert_parses(sql: &str, dialect: Dialect) {
    let result = match dialect {
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql),
        _ => Parser::parse_sql(&SQLiteDialect {}, sql),
    };
    assert!(result.is_ok(), "failed to parse {sql}: {result:?}");
}

#[test]
fn test_detail_with_every_dimension() {
    let params = FilterParams::new()
        .with("VENDOR", "Applied")
        .with("STATE_ABBR", "OH")
        .with("PRIMARY_AGENCY_ID", "3")
        .with("PROD_LINE", "PL")
        .with("STAT_PROFILE_DATE_YEAR", "2010");
    let stmt = composer(Dialect::Sqlite)
        .compose(&agency::detail_query(), &params)
        .unwrap();

    assert_snapshot!(stmt.sql, @r#"
    SELECT
      "insurance".*
    FROM "insurance"
    INNER JOIN "agency" ON "agency"."id" = "insurance"."AGENCY_ID"
    INNER JOIN "product" ON "product"."id" = "insurance"."PRODUCT_ID"
    INNER JOIN "state" ON "state"."id" = "insurance"."STATE_ID"
    INNER JOIN "vendor" ON "vendor"."id" = "insurance"."VENDOR_ID"
    WHERE "vendor"."VENDOR" = ? AND "state"."STATE_ABBR" = ? AND "agency"."PRIMARY_AGENCY_ID" = ? AND "product"."PROD_LINE" = ? AND "insurance"."STAT_PROFILE_DATE_YEAR" = ?;
    "#);
    assert_eq!(
        stmt.params,
        vec![
            Value::from("Applied"),
            Value::from("OH"),
            Value::from("3"),
            Value::from("PL"),
            Value::from("2010"),
        ]
    );
    assert_parses(&stmt.sql, Dialect::Sqlite);
}

#[test]
fn test_fact_parameters_add_no_joins() {
    let params = FilterParams::new()
        .with("AGENCY_ID", "3")
        .with("PL_START_YEAR", "2008");
    let stmt = composer(Dialect::Sqlite)
        .compose(&agency::summary_query(), &params)
        .unwrap();

    assert!(!stmt.sql.contains("JOIN"));
    assert!(stmt
        .sql
        .ends_with("WHERE \"insurance\".\"AGENCY_ID\" = ? AND \"insurance\".\"PL_START_YEAR\" = ?;"));
    assert_parses(&stmt.sql, Dialect::Sqlite);
}

#[test]
fn test_two_parameters_same_dimension_join_once() {
    let params = FilterParams::new()
        .with("PROD_ABBR", "HO")
        .with("PROD_LINE", "PL");
    let stmt = composer(Dialect::Sqlite)
        .compose(&agency::summary_query(), &params)
        .unwrap();

    assert_eq!(stmt.sql.matches("INNER JOIN").count(), 1);
    assert_eq!(stmt.params.len(), 2);
}

#[test]
fn test_first_unknown_parameter_is_reported() {
    let params = FilterParams::new()
        .with("PROD_LINE", "PL")
        .with("COLOR", "red")
        .with("SIZE", "xl");
    let err = composer(Dialect::Sqlite)
        .compose(&agency::detail_query(), &params)
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid parameter `COLOR`.");
}

#[test]
fn test_injection_attempt_stays_a_value() {
    let hostile = "PL'; DROP TABLE insurance; --";
    let params = FilterParams::new().with("PROD_LINE", hostile);
    let stmt = composer(Dialect::Sqlite)
        .compose(&agency::detail_query(), &params)
        .unwrap();

    assert!(!stmt.sql.contains("DROP"));
    assert_eq!(stmt.params, vec![Value::from(hostile)]);
    assert!(stmt
        .interpolated()
        .contains("'PL''; DROP TABLE insurance; --'"));
}

#[test]
fn test_report_reuses_aliased_product() {
    let params = FilterParams::new().with("PROD_LINE", "CL");
    let stmt = composer(Dialect::Sqlite)
        .compose(&agency::report_query(), &params)
        .unwrap();

    assert_eq!(stmt.sql.matches("JOIN").count(), 1);
    assert!(stmt.sql.contains("WHERE \"p\".\"PROD_LINE\" = ?"));
    assert_parses(&stmt.sql, Dialect::Sqlite);
}

#[test]
fn test_postgres_placeholders_are_numbered() {
    let params = FilterParams::new()
        .with("STATE_ABBR", "OH")
        .with("VENDOR", "Applied");
    let stmt = composer(Dialect::Postgres)
        .compose(&agency::detail_query(), &params)
        .unwrap();

    assert!(stmt
        .sql
        .ends_with("WHERE \"state\".\"STATE_ABBR\" = $1 AND \"vendor\".\"VENDOR\" = $2;"));
    assert_parses(&stmt.sql, Dialect::Postgres);
}

#[test]
fn test_equality_values_are_not_format_checked() {
    let params = FilterParams::new().with("STAT_PROFILE_DATE_YEAR", "twenty-ten");
    let stmt = composer(Dialect::Sqlite)
        .compose(&agency::detail_query(), &params)
        .unwrap();
    assert_eq!(stmt.params, vec![Value::from("twenty-ten")]);
}

#[test]
fn test_catalog_errors_compare_by_value() {
    let err = composer(Dialect::Sqlite)
        .compose(&agency::detail_query(), &FilterParams::new().with("id", "1"))
        .unwrap_err();
    assert_eq!(err, ParamError::UnknownParameter { name: "id".into() });
}
