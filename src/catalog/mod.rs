//! Filter parameters and the catalog of tables that own them.
//!
//! A [`ParameterCatalog`] maps every accepted parameter name to the table
//! holding the column of the same name. It is built once, never mutated, and
//! shared freely between threads. Consumers that accept only part of the
//! catalog narrow it with [`ParameterCatalog::accepting`].

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::dataset::Value;

/// Caller input errors. Messages are safe to show to clients and never
/// contain SQL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("Invalid parameter `{name}`.")]
    UnknownParameter { name: String },

    #[error("{name} must follow the format {expected}")]
    MalformedValue { name: String, expected: String },

    /// Raised while building a catalog, not while serving requests.
    #[error("Parameter `{name}` is declared more than once")]
    DuplicateParameter { name: String },
}

pub type ParamResult<T> = Result<T, ParamError>;

// =============================================================================
// Runtime parameters
// =============================================================================

/// Caller-supplied `(name, value)` pairs in arrival order.
///
/// A name supplied twice keeps its first value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    entries: Vec<(String, Value)>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter unless the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        if self.get(&name).is_none() {
            self.entries.push((name, value.into()));
        }
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FilterParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = FilterParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Echoed back to callers as a JSON object.
impl Serialize for FilterParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Accepted parameter names and their owning tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterCatalog {
    fact_table: String,
    owners: BTreeMap<String, String>,
}

impl ParameterCatalog {
    /// Build a catalog. Every name must appear exactly once.
    pub fn from_entries<I, N, T>(fact_table: &str, entries: I) -> ParamResult<Self>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut owners = BTreeMap::new();
        for (name, table) in entries {
            let name = name.into();
            if owners.contains_key(&name) {
                return Err(ParamError::DuplicateParameter { name });
            }
            owners.insert(name, table.into());
        }
        Ok(Self {
            fact_table: fact_table.into(),
            owners,
        })
    }

    pub fn fact_table(&self) -> &str {
        &self.fact_table
    }

    /// Table owning `name`, if the parameter is known.
    pub fn owner(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(String::as_str)
    }

    /// Owning table, or [`ParamError::UnknownParameter`].
    pub fn require_owner(&self, name: &str) -> ParamResult<&str> {
        self.owner(name).ok_or_else(|| ParamError::UnknownParameter {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// `(parameter, owner)` pairs sorted by parameter name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.owners.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    /// Dimension tables reachable from the catalog, sorted and deduplicated.
    pub fn dimension_tables(&self) -> BTreeSet<&str> {
        self.owners
            .values()
            .map(String::as_str)
            .filter(|table| *table != self.fact_table)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Fail on the first name the catalog does not know.
    pub fn validate<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> ParamResult<()> {
        for name in names {
            self.require_owner(name)?;
        }
        Ok(())
    }

    /// Narrow the catalog to the names a particular consumer accepts.
    pub fn accepting(&self, names: &[&str]) -> ParamResult<AcceptedParams> {
        self.validate(names.iter().copied())?;
        Ok(AcceptedParams {
            names: names.iter().map(|n| n.to_string()).collect(),
        })
    }
}

/// A consumer-specific subset of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedParams {
    names: BTreeSet<String>,
}

impl AcceptedParams {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn validate<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> ParamResult<()> {
        match names.into_iter().find(|name| !self.contains(name)) {
            Some(name) => Err(ParamError::UnknownParameter {
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }
}
