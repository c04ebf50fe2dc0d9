//! Connection collaborator contracts.
//!
//! The engine never talks to a database directly. It hands finished SQL and a
//! flat argument list to these traits and reads rows back through them.
//! Cancellation lives in `Connection::Context`, which is passed through to
//! every call untouched.

use crate::{error::Error, value::Value};

///
/// Connection
///

pub trait Connection {
    /// Caller-owned cancellation/deadline handle.
    type Context: ?Sized;
}

///
/// RowScanner
///
/// Positional row reader. `width` is the number of columns the statement
/// selected; implementations return exactly that many values.
///

pub trait RowScanner {
    fn scan(&mut self, width: usize) -> Result<Vec<Value>, Error>;
}

///
/// Rows
///
/// Row cursor. `advance` moves to the next row and reports whether one
/// exists; `scan` reads the current row. Dropping the cursor releases it.
///

pub trait Rows: RowScanner {
    fn advance(&mut self) -> Result<bool, Error>;
}

///
/// Queryable
///

pub trait Queryable: Connection {
    type Rows<'a>: Rows
    where
        Self: 'a;

    type Row<'a>: RowScanner
    where
        Self: 'a;

    fn query_rows<'a>(
        &'a self,
        ctx: &Self::Context,
        sql: &str,
        args: &[Value],
    ) -> Result<Self::Rows<'a>, Error>;

    /// Single-row query. Errors, including `NoRows`, surface from `scan`.
    fn query_row<'a>(&'a self, ctx: &Self::Context, sql: &str, args: &[Value]) -> Self::Row<'a>;
}

///
/// ExecResult
///

pub trait ExecResult {
    /// Identifier assigned by the database to the last inserted row.
    fn last_insert_id(&self) -> Result<i64, Error>;
}

///
/// Executable
///

pub trait Executable: Connection {
    type Result: ExecResult;

    fn exec(&self, ctx: &Self::Context, sql: &str, args: &[Value]) -> Result<Self::Result, Error>;
}
