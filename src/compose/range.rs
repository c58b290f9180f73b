//! Inclusive year-range filtering.

use crate::catalog::{FilterParams, ParamError, ParamResult};
use crate::dataset::Value;
use crate::sql::{table_col, BoundStatement, Dialect, ExprExt, Query};

/// Format named in [`ParamError::MalformedValue`] for year bounds.
pub const YEAR_FORMAT: &str = "YYYY";

/// The two parameters that bound a range, both compared against columns of
/// the same name on `qualifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub qualifier: String,
    pub start_param: String,
    pub end_param: String,
}

impl RangeSpec {
    pub fn new(qualifier: &str, start_param: &str, end_param: &str) -> Self {
        Self {
            qualifier: qualifier.into(),
            start_param: start_param.into(),
            end_param: end_param.into(),
        }
    }

    fn accepts(&self, name: &str) -> bool {
        name == self.start_param || name == self.end_param
    }
}

/// Append `>= start` and `<= end` predicates for whichever bounds are
/// present. Only the two range parameters are legal, and each value must be
/// exactly four ASCII digits.
pub fn compose_range(
    base: &Query,
    params: &FilterParams,
    range: &RangeSpec,
    dialect: Dialect,
) -> ParamResult<BoundStatement> {
    if let Some(unknown) = params.names().find(|name| !range.accepts(name)) {
        return Err(ParamError::UnknownParameter {
            name: unknown.to_string(),
        });
    }

    let start = params
        .get(&range.start_param)
        .map(|value| parse_year(&range.start_param, value))
        .transpose()?;
    let end = params
        .get(&range.end_param)
        .map(|value| parse_year(&range.end_param, value))
        .transpose()?;

    let mut query = base.clone();
    if let Some(year) = start {
        query = query.filter(table_col(&range.qualifier, &range.start_param).gte(Value::Int(year)));
    }
    if let Some(year) = end {
        query = query.filter(table_col(&range.qualifier, &range.end_param).lte(Value::Int(year)));
    }

    Ok(query.bind(dialect))
}

fn parse_year(name: &str, value: &Value) -> ParamResult<i64> {
    let text = value.to_string();
    let malformed = || ParamError::MalformedValue {
        name: name.to_string(),
        expected: YEAR_FORMAT.to_string(),
    };

    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    text.parse().map_err(|_| malformed())
}
