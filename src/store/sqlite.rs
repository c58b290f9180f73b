//! SQLite-backed store.

use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use tracing::{debug, info};

use super::{Store, StoreError, StoreResult, WriteMode};
use crate::dataset::{Column, ColumnType, Dataset, Value};
use crate::model::SURROGATE_KEY;
use crate::sql::{count_star, param, BoundStatement, ColumnDef, CreateTable, Dialect, DropTable, ExprExt, Insert, Query, TableRef};

/// A [`Store`] over a single SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened SQLite store");
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Whether a table with this name exists.
    pub fn has_table(&self, table: &str) -> StoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        let statement = Query::new()
            .select(vec![count_star().alias("n")])
            .from(TableRef::new(table))
            .bind(Dialect::Sqlite);
        let result = self.execute(&statement)?;
        Ok(result
            .value(0, "n")
            .and_then(Value::as_i64)
            .unwrap_or_default() as usize)
    }
}

impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&self, statement: &BoundStatement) -> StoreResult<Dataset> {
        if statement.dialect() != Dialect::Sqlite {
            return Err(StoreError::DialectMismatch {
                expected: Dialect::Sqlite,
                found: statement.dialect(),
            });
        }

        let mut stmt = self.conn.prepare(&statement.sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = names.len();

        let rows = stmt
            .query_map(params_from_iter(statement.params.iter()), |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(value_from_sql))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let column_type = ColumnType::infer(rows.iter().map(|row| &row[i]));
                Column::new(name, column_type)
            })
            .collect();

        debug!(rows = rows.len(), columns = width, "Statement executed");
        Ok(Dataset::from_rows(columns, rows)?)
    }

    fn write(&mut self, data: &Dataset, table: &str, mode: WriteMode) -> StoreResult<usize> {
        if data.width() == 0 {
            return Err(StoreError::NoColumns {
                table: table.to_string(),
            });
        }

        check_primary_key(data, table)?;

        let create = CreateTable::new(table).columns(data.columns().iter().map(column_def));
        let create = match mode {
            WriteMode::Replace => create,
            WriteMode::Append => create.if_not_exists(),
        };

        let tx = self.conn.transaction()?;
        if mode == WriteMode::Replace {
            tx.execute(&DropTable::new(table).if_exists().to_sql(Dialect::Sqlite), [])?;
        }
        tx.execute(&create.to_sql(Dialect::Sqlite), [])?;

        let insert = Insert::into(table)
            .columns(data.column_names())
            .values(data.columns().iter().map(|_| param(Value::Null)))
            .bind(Dialect::Sqlite);
        {
            let mut stmt = tx.prepare(&insert.sql)?;
            for row in data.rows() {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        info!(table, rows = data.len(), mode = %mode, "Table written");
        Ok(data.len())
    }
}

/// Integer surrogate keys become the table's primary key.
fn is_primary_key(column: &Column) -> bool {
    column.name == SURROGATE_KEY && column.column_type == ColumnType::Integer
}

fn column_def(column: &Column) -> ColumnDef {
    let def = ColumnDef::from(column);
    if is_primary_key(column) {
        def.primary_key()
    } else {
        def
    }
}

fn check_primary_key(data: &Dataset, table: &str) -> StoreResult<()> {
    let Some(key) = data.columns().iter().find(|c| is_primary_key(c)) else {
        return Ok(());
    };
    match data.column_values(&key.name)?.into_iter().position(Value::is_null) {
        Some(row) => Err(StoreError::NullPrimaryKey {
            table: table.to_string(),
            column: key.name.clone(),
            row,
        }),
        None => Ok(()),
    }
}

fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Int(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Float(f) if f.is_finite() => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Float(_) => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}
