//! Relational operations over [`Dataset`]s.
//!
//! All operations borrow the receiver and return a fresh dataset.

use std::collections::{HashMap, HashSet};

use super::{Column, ColumnType, Dataset, DatasetError, DatasetResult, Value};

impl Dataset {
    /// Keep only the named columns, in the given order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> DatasetResult<Dataset> {
        let indices = self.indices_of(names)?;
        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Dataset::from_rows(columns, rows)
    }

    /// Remove duplicate rows, keeping the first occurrence of each.
    ///
    /// Rows are compared by full value equality; nulls compare equal to nulls.
    pub fn distinct(&self) -> Dataset {
        let mut seen: HashSet<&[Value]> = HashSet::with_capacity(self.rows.len());
        let rows = self
            .rows
            .iter()
            .filter(|row| seen.insert(row.as_slice()))
            .cloned()
            .collect();
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rename a column. Renaming onto another existing column is an error.
    pub fn rename_column(&self, from: &str, to: &str) -> DatasetResult<Dataset> {
        let idx = self.require_column(from)?;
        if from != to && self.has_column(to) {
            return Err(DatasetError::DuplicateColumn { column: to.into() });
        }
        let mut out = self.clone();
        out.columns[idx].name = to.into();
        Ok(out)
    }

    /// Remove the named columns. Every name must exist.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> DatasetResult<Dataset> {
        let dropped: HashSet<usize> = self.indices_of(names)?.into_iter().collect();
        let keep: Vec<usize> = (0..self.width()).filter(|i| !dropped.contains(i)).collect();
        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Dataset::from_rows(columns, rows)
    }

    /// Add a column at the end, or replace an existing column of the same name
    /// in place.
    pub fn with_column(&self, column: Column, values: Vec<Value>) -> DatasetResult<Dataset> {
        match self.column_index(&column.name) {
            Some(idx) => {
                self.check_length(&column, &values)?;
                let mut out = self.clone();
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
                out.columns[idx] = column;
                Ok(out)
            }
            None => self.with_column_at(self.width(), column, values),
        }
    }

    /// Insert a new column at `position` (clamped to the column count).
    pub fn with_column_at(
        &self,
        position: usize,
        column: Column,
        values: Vec<Value>,
    ) -> DatasetResult<Dataset> {
        if self.has_column(&column.name) {
            return Err(DatasetError::DuplicateColumn {
                column: column.name,
            });
        }
        self.check_length(&column, &values)?;

        let position = position.min(self.width());
        let mut out = self.clone();
        out.columns.insert(position, column);
        for (row, value) in out.rows.iter_mut().zip(values) {
            row.insert(position, value);
        }
        Ok(out)
    }

    /// Left lookup against `other` on equality of the `keys` columns.
    ///
    /// Returns one value of `other.value_column` per row of `self`, in row
    /// order. Rows with no match yield [`Value::Null`]; a row matching more
    /// than one row of `other` is an [`DatasetError::AmbiguousMatch`].
    pub fn lookup<S: AsRef<str>>(
        &self,
        keys: &[S],
        other: &Dataset,
        value_column: &str,
    ) -> DatasetResult<Vec<Value>> {
        let left = self.indices_of(keys)?;
        let right = other.indices_of(keys)?;
        let value_idx = other.require_column(value_column)?;

        let mut index: HashMap<Vec<&Value>, Vec<usize>> = HashMap::with_capacity(other.len());
        for (i, row) in other.rows.iter().enumerate() {
            let key = right.iter().map(|&c| &row[c]).collect();
            index.entry(key).or_default().push(i);
        }

        self.rows
            .iter()
            .enumerate()
            .map(|(row_no, row)| {
                let key: Vec<&Value> = left.iter().map(|&c| &row[c]).collect();
                match index.get(&key).map(Vec::as_slice) {
                    None | Some([]) => Ok(Value::Null),
                    Some([hit]) => Ok(other.rows[*hit][value_idx].clone()),
                    Some(hits) => Err(DatasetError::AmbiguousMatch {
                        row: row_no,
                        matches: hits.len(),
                    }),
                }
            })
            .collect()
    }

    /// Replace NaN floats with nulls.
    pub fn nulls_normalized(&self) -> Dataset {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| match value {
                        Value::Float(f) if f.is_nan() => Value::Null,
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect();
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Add (or overwrite) an integer column holding 1-based row numbers.
    pub fn with_row_ids(&self, name: &str) -> DatasetResult<Dataset> {
        let ids = (1..=self.len() as i64).map(Value::Int).collect();
        self.with_column(Column::new(name, ColumnType::Integer), ids)
    }

    fn indices_of<S: AsRef<str>>(&self, names: &[S]) -> DatasetResult<Vec<usize>> {
        names
            .iter()
            .map(|name| self.require_column(name.as_ref()))
            .collect()
    }

    fn check_length(&self, column: &Column, values: &[Value]) -> DatasetResult<()> {
        if values.len() != self.len() {
            return Err(DatasetError::LengthMismatch {
                column: column.name.clone(),
                expected: self.len(),
                found: values.len(),
            });
        }
        Ok(())
    }
}
