//! Parameter-driven query composition.
//!
//! The composer takes a fixed base [`Query`] and a set of caller parameters
//! and produces a complete [`BoundStatement`]:
//!
//! 1. every parameter name is checked against the catalog before anything is
//!    rendered;
//! 2. each parameter owned by a dimension contributes one join descriptor;
//!    the set is deduplicated and ordered by table name;
//! 3. each parameter contributes one equality predicate, ANDed in the order
//!    the caller supplied them.
//!
//! Values never appear in the SQL text. They are carried as bound parameters
//! and rendered through the dialect's placeholder syntax.

mod range;

pub use range::{compose_range, RangeSpec, YEAR_FORMAT};

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::{FilterParams, ParamResult, ParameterCatalog};
use crate::model::{foreign_key_column, SURROGATE_KEY};
use crate::sql::{table_col, BoundStatement, Dialect, Expr, ExprExt, Query, TableRef};

/// `INNER JOIN <table> ON <table>.id = <fact>.<TABLE>_ID`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct JoinDescriptor {
    pub table: String,
}

impl JoinDescriptor {
    fn on(&self, fact_qualifier: &str) -> Expr {
        table_col(&self.table, SURROGATE_KEY)
            .eq(table_col(fact_qualifier, &foreign_key_column(&self.table)))
    }
}

/// Composes filtered statements over a fixed catalog.
#[derive(Debug, Clone)]
pub struct QueryComposer {
    catalog: ParameterCatalog,
    dialect: Dialect,
}

impl QueryComposer {
    pub fn new(catalog: ParameterCatalog, dialect: Dialect) -> Self {
        Self { catalog, dialect }
    }

    pub fn catalog(&self) -> &ParameterCatalog {
        &self.catalog
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Equality composition: one join per distinct dimension owner and one
    /// `owner.NAME = value` predicate per parameter.
    pub fn compose(&self, base: &Query, params: &FilterParams) -> ParamResult<BoundStatement> {
        self.catalog.validate(params.names())?;

        let fact_qualifier = base
            .qualifier_for(self.catalog.fact_table())
            .unwrap_or(self.catalog.fact_table())
            .to_string();

        let mut joins = BTreeSet::new();
        let mut predicates = Vec::with_capacity(params.len());
        for (name, value) in params.iter() {
            let owner = self.catalog.require_owner(name)?;
            if owner != self.catalog.fact_table() && !base.references_table(owner) {
                joins.insert(JoinDescriptor {
                    table: owner.to_string(),
                });
            }
            let qualifier = base.qualifier_for(owner).unwrap_or(owner).to_string();
            predicates.push(table_col(&qualifier, name).eq(value.clone()));
        }

        let query = joins.iter().fold(base.clone(), |query, join| {
            query.inner_join(TableRef::new(&join.table), join.on(&fact_qualifier))
        });
        let query = predicates.into_iter().fold(query, Query::filter);

        let statement = query.bind(self.dialect);
        debug!(
            joins = joins.len(),
            params = statement.params.len(),
            sql = %statement.sql,
            "Composed statement"
        );
        Ok(statement)
    }

    /// Year-range composition; see [`compose_range`].
    pub fn compose_range(
        &self,
        base: &Query,
        params: &FilterParams,
        range: &RangeSpec,
    ) -> ParamResult<BoundStatement> {
        compose_range(base, params, range, self.dialect)
    }
}
