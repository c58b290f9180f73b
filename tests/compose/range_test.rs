use insta::assert_snapshot;
use starschema::agency;
use starschema::catalog::{FilterParams, ParamError};
use starschema::compose::{compose_range, YEAR_FORMAT};
use starschema::dataset::Value;
use starschema::sql::Dialect;

fn report(params: &FilterParams) -> Result<starschema::sql::BoundStatement, ParamError> {
    compose_range(
        &agency::report_query(),
        params,
        &agency::report_range(),
        Dialect::Sqlite,
    )
}

#[test]
fn test_no_bounds_is_the_base_report() {
    let stmt = report(&FilterParams::new()).unwrap();
    assert!(!stmt.sql.contains("WHERE"));
    assert!(stmt.params.is_empty());
}

#[test]
fn test_both_bounds() {
    let params = FilterParams::new()
        .with("PL_END_YEAR", "2015")
        .with("PL_START_YEAR", "2010");
    let stmt = report(&params).unwrap();

    assert_snapshot!(stmt.sql, @r#"
    SELECT
      "i"."AGENCY_ID" AS "agency_id",
      "p"."PROD_LINE" AS "product_line",
      SUM("i"."NB_WRTN_PREM_AMT") AS "nb_wrtn_prem_amt_sum",
      SUM("i"."WRTN_PREM_AMT") AS "wrtn_prem_amt_sum",
      SUM("i"."PREV_WRTN_PREM_AMT") AS "prev_wrtn_prem_amt_sum",
      SUM("i"."PRD_ERND_PREM_AMT") AS "prd_ernd_prem_amt_sum"
    FROM "insurance" AS "i"
    INNER JOIN "product" AS "p" ON "p"."id" = "i"."PRODUCT_ID"
    WHERE "i"."PL_START_YEAR" >= ? AND "i"."PL_END_YEAR" <= ?
    GROUP BY "i"."AGENCY_ID", "p"."PROD_LINE";
    "#);
    // Start bound first regardless of arrival order.
    assert_eq!(stmt.params, vec![Value::Int(2010), Value::Int(2015)]);
}

#[test]
fn test_single_bound() {
    let stmt = report(&FilterParams::new().with("PL_END_YEAR", "2012")).unwrap();
    assert!(stmt.sql.contains("WHERE \"i\".\"PL_END_YEAR\" <= ?"));
    assert!(!stmt.sql.contains(">="));
    assert_eq!(stmt.params, vec![Value::Int(2012)]);
}

#[test]
fn test_malformed_years() {
    for bad in ["201", "20101", "2O10", " 2010", "-201", ""] {
        let err = report(&FilterParams::new().with("PL_START_YEAR", bad)).unwrap_err();
        assert_eq!(
            err,
            ParamError::MalformedValue {
                name: "PL_START_YEAR".into(),
                expected: YEAR_FORMAT.into(),
            },
            "{bad:?}"
        );
    }
}

#[test]
fn test_integer_year_value_accepted() {
    let stmt = report(&FilterParams::new().with("PL_START_YEAR", 2011)).unwrap();
    assert_eq!(stmt.params, vec![Value::Int(2011)]);
}

#[test]
fn test_other_catalog_parameters_rejected() {
    let params = FilterParams::new()
        .with("PL_START_YEAR", "2010")
        .with("STATE_ABBR", "OH");
    let err = report(&params).unwrap_err();
    assert_eq!(err.to_string(), "Invalid parameter `STATE_ABBR`.");
}
