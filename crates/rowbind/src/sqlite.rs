//! SQLite collaborator backed by `rusqlite`.
//!
//! Implements the connection contracts for `rusqlite::Connection` and
//! `rusqlite::Transaction`. Multi-row results are read into memory before
//! the cursor is handed to the engine, so the prepared statement never
//! outlives the call that created it.

use crate::{
    conn::{Connection, ExecResult, Executable, Queryable, RowScanner, Rows},
    error::Error,
    value::Value,
};
use rusqlite::{
    params_from_iter,
    types::{Value as SqlValue, ValueRef},
};
use std::collections::VecDeque;

///
/// SqliteRows
///

#[derive(Debug, Default)]
pub struct SqliteRows {
    pending: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl RowScanner for SqliteRows {
    fn scan(&mut self, _width: usize) -> Result<Vec<Value>, Error> {
        self.current.take().ok_or(Error::NoRows)
    }
}

impl Rows for SqliteRows {
    fn advance(&mut self) -> Result<bool, Error> {
        self.current = self.pending.pop_front();

        Ok(self.current.is_some())
    }
}

///
/// SqliteRow
///
/// Outcome of a single-row query, surfaced on the first `scan`.
///

#[derive(Debug)]
pub struct SqliteRow(Option<Result<Vec<Value>, Error>>);

impl RowScanner for SqliteRow {
    fn scan(&mut self, _width: usize) -> Result<Vec<Value>, Error> {
        self.0.take().unwrap_or(Err(Error::NoRows))
    }
}

///
/// SqliteResult
///

#[derive(Clone, Copy, Debug)]
pub struct SqliteResult {
    pub rows_affected: usize,
    pub last_insert_rowid: i64,
}

impl ExecResult for SqliteResult {
    fn last_insert_id(&self) -> Result<i64, Error> {
        Ok(self.last_insert_rowid)
    }
}

// impl_sqlite
// both handles expose the same API through `Deref<Target = Connection>`
macro_rules! impl_sqlite {
    ( $( $type:ty ),* $(,)? ) => {
        $(
            impl Connection for $type {
                type Context = ();
            }

            impl Queryable for $type {
                type Rows<'a> = SqliteRows where Self: 'a;
                type Row<'a> = SqliteRow where Self: 'a;

                fn query_rows<'a>(
                    &'a self,
                    _ctx: &(),
                    sql: &str,
                    args: &[Value],
                ) -> Result<SqliteRows, Error> {
                    fetch(self, sql, args, usize::MAX).map(|rows| SqliteRows {
                        pending: rows,
                        current: None,
                    })
                }

                fn query_row<'a>(&'a self, _ctx: &(), sql: &str, args: &[Value]) -> SqliteRow {
                    let row = fetch(self, sql, args, 1)
                        .and_then(|mut rows| rows.pop_front().ok_or(Error::NoRows));

                    SqliteRow(Some(row))
                }
            }

            impl Executable for $type {
                type Result = SqliteResult;

                fn exec(&self, _ctx: &(), sql: &str, args: &[Value]) -> Result<SqliteResult, Error> {
                    let params = bind(args)?;
                    let rows_affected = self
                        .execute(sql, params_from_iter(params))
                        .map_err(from_sqlite)?;

                    Ok(SqliteResult {
                        rows_affected,
                        last_insert_rowid: self.last_insert_rowid(),
                    })
                }
            }
        )*
    };
}

impl_sqlite!(rusqlite::Connection, rusqlite::Transaction<'_>);

// fetch
// runs `sql` and reads at most `limit` rows
fn fetch(
    conn: &rusqlite::Connection,
    sql: &str,
    args: &[Value],
    limit: usize,
) -> Result<VecDeque<Vec<Value>>, Error> {
    let params = bind(args)?;
    let mut stmt = conn.prepare(sql).map_err(from_sqlite)?;
    let width = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(params)).map_err(from_sqlite)?;

    let mut out = VecDeque::new();
    while out.len() < limit {
        let Some(row) = rows.next().map_err(from_sqlite)? else {
            break;
        };

        let values = (0..width)
            .map(|i| row.get_ref(i).map_err(from_sqlite).and_then(read))
            .collect::<Result<Vec<_>, _>>()?;
        out.push_back(values);
    }

    Ok(out)
}

fn bind(args: &[Value]) -> Result<Vec<SqlValue>, Error> {
    args.iter().map(to_sql).collect()
}

fn to_sql(value: &Value) -> Result<SqlValue, Error> {
    Ok(match value {
        Value::Blob(v) => SqlValue::Blob(v.clone()),
        Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
        Value::Float(v) => SqlValue::Real(*v),
        Value::Int(v) => SqlValue::Integer(*v),
        Value::Null => SqlValue::Null,
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Uint(v) => SqlValue::Integer(
            i64::try_from(*v).map_err(|_| Error::driver(format!("{v} overflows an sqlite integer")))?,
        ),
        Value::List(_) => {
            return Err(Error::driver(
                "list argument reached the driver without a matching placeholder",
            ));
        }
    })
}

fn read(value: ValueRef<'_>) -> Result<Value, Error> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(Error::driver)?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

fn from_sqlite(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::QueryReturnedNoRows => Error::NoRows,
        other => Error::driver(other),
    }
}
