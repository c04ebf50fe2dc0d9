//! Scripted in-memory connection for engine tests.

use crate::{
    conn::{Connection, ExecResult, Executable, Queryable, RowScanner, Rows},
    error::Error,
    record::{ReadableRecord, Record, WritableRecord, scan_row},
    value::{FieldValue, Value, decode},
};
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

///
/// MockConn
///
/// Records every statement it receives and replays queued results.
///

#[derive(Default)]
pub struct MockConn {
    pub statements: RefCell<Vec<(String, Vec<Value>)>>,
    pub rows: RefCell<VecDeque<Result<Vec<Value>, Error>>>,
    pub query_error: RefCell<Option<Error>>,
    pub exec_error: RefCell<Option<Error>>,
    pub last_id: Cell<i64>,
    pub cursor_open: Rc<Cell<bool>>,
}

impl MockConn {
    pub fn with_rows(rows: Vec<Result<Vec<Value>, Error>>) -> Self {
        let conn = Self::default();
        conn.rows.borrow_mut().extend(rows);
        conn
    }

    pub fn last_statement(&self) -> (String, Vec<Value>) {
        self.statements
            .borrow()
            .last()
            .cloned()
            .expect("a statement was issued")
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.statements
            .borrow_mut()
            .push((sql.to_string(), args.to_vec()));
    }
}

impl Connection for MockConn {
    type Context = ();
}

pub struct MockRows {
    pending: VecDeque<Result<Vec<Value>, Error>>,
    current: Option<Result<Vec<Value>, Error>>,
    open: Rc<Cell<bool>>,
}

impl RowScanner for MockRows {
    fn scan(&mut self, _width: usize) -> Result<Vec<Value>, Error> {
        self.current.take().unwrap_or(Err(Error::NoRows))
    }
}

impl Rows for MockRows {
    fn advance(&mut self) -> Result<bool, Error> {
        self.current = self.pending.pop_front();
        Ok(self.current.is_some())
    }
}

impl Drop for MockRows {
    fn drop(&mut self) {
        self.open.set(false);
    }
}

pub struct MockRow(Option<Result<Vec<Value>, Error>>);

impl RowScanner for MockRow {
    fn scan(&mut self, _width: usize) -> Result<Vec<Value>, Error> {
        self.0.take().unwrap_or(Err(Error::NoRows))
    }
}

impl Queryable for MockConn {
    type Rows<'a> = MockRows;
    type Row<'a> = MockRow;

    fn query_rows<'a>(&'a self, _ctx: &(), sql: &str, args: &[Value]) -> Result<MockRows, Error> {
        self.record(sql, args);
        if let Some(err) = self.query_error.borrow_mut().take() {
            return Err(err);
        }
        self.cursor_open.set(true);

        Ok(MockRows {
            pending: self.rows.borrow_mut().drain(..).collect(),
            current: None,
            open: Rc::clone(&self.cursor_open),
        })
    }

    fn query_row<'a>(&'a self, _ctx: &(), sql: &str, args: &[Value]) -> MockRow {
        self.record(sql, args);
        if let Some(err) = self.query_error.borrow_mut().take() {
            return MockRow(Some(Err(err)));
        }

        MockRow(self.rows.borrow_mut().pop_front())
    }
}

pub struct MockResult(Option<i64>);

impl ExecResult for MockResult {
    fn last_insert_id(&self) -> Result<i64, Error> {
        self.0.ok_or_else(|| Error::driver("last insert id is not supported"))
    }
}

impl Executable for MockConn {
    type Result = MockResult;

    fn exec(&self, _ctx: &(), sql: &str, args: &[Value]) -> Result<MockResult, Error> {
        self.record(sql, args);
        if let Some(err) = self.exec_error.borrow_mut().take() {
            return Err(err);
        }

        let id = self.last_id.get();
        Ok(MockResult((id > 0).then_some(id)))
    }
}

///
/// Person
///
/// Hand-written accessors in the shape the generator emits.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

impl Person {
    pub fn row(id: i64, name: &str, created_at: &str) -> Vec<Value> {
        vec![
            Value::Int(id),
            Value::Text(name.to_string()),
            Value::Text(created_at.to_string()),
        ]
    }
}

impl Record for Person {
    fn table() -> &'static str {
        "person"
    }
}

impl ReadableRecord for Person {
    fn columns() -> &'static [&'static str] {
        &["id", "name", "created_at"]
    }

    fn scan(&mut self, row: &mut dyn RowScanner) -> Result<(), Error> {
        let values = scan_row(row, 3)?;
        let arg0: i64 = decode(&values, 0, "id")?;
        let arg1: String = decode(&values, 1, "name")?;
        let arg2: String = decode(&values, 2, "created_at")?;

        self.id = arg0;
        self.name = arg1;
        self.created_at = arg2;

        Ok(())
    }
}

impl WritableRecord for Person {
    fn primary_keys() -> &'static [&'static str] {
        &["id"]
    }

    fn primary_values(&self) -> Vec<Value> {
        vec![Value::Int(self.id)]
    }

    fn value_columns() -> &'static [&'static str] {
        &["name", "created_at"]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.created_at.clone()),
        ]
    }

    fn auto_increment_column() -> Option<&'static str> {
        Some("id")
    }
}

///
/// Membership
///
/// Composite key, no auto-increment.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Membership {
    pub group_id: i64,
    pub user_id: i64,
    pub role: String,
}

impl Record for Membership {
    fn table() -> &'static str {
        "membership"
    }
}

impl WritableRecord for Membership {
    fn primary_keys() -> &'static [&'static str] {
        &["group_id", "user_id"]
    }

    fn primary_values(&self) -> Vec<Value> {
        vec![Value::Int(self.group_id), Value::Int(self.user_id)]
    }

    fn value_columns() -> &'static [&'static str] {
        &["role"]
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.role.clone())]
    }
}

///
/// Tagged
///
/// Carries a sequence-typed column, which no write statement can bind.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tagged {
    pub id: i64,
    pub tags: Vec<i64>,
}

impl Record for Tagged {
    fn table() -> &'static str {
        "tagged"
    }
}

impl WritableRecord for Tagged {
    fn primary_keys() -> &'static [&'static str] {
        &["id"]
    }

    fn primary_values(&self) -> Vec<Value> {
        vec![Value::Int(self.id)]
    }

    fn value_columns() -> &'static [&'static str] {
        &["tags"]
    }

    fn values(&self) -> Vec<Value> {
        vec![self.tags.to_value()]
    }
}

///
/// Counter
///
/// Only an auto-increment key.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Counter {
    pub id: i64,
}

impl Record for Counter {
    fn table() -> &'static str {
        "counter"
    }
}

impl WritableRecord for Counter {
    fn primary_keys() -> &'static [&'static str] {
        &["id"]
    }

    fn primary_values(&self) -> Vec<Value> {
        vec![Value::Int(self.id)]
    }

    fn value_columns() -> &'static [&'static str] {
        &[]
    }

    fn values(&self) -> Vec<Value> {
        Vec::new()
    }

    fn auto_increment_column() -> Option<&'static str> {
        Some("id")
    }
}

///
/// Unmapped
///

#[derive(Default)]
pub struct Unmapped;

impl Record for Unmapped {
    fn table() -> &'static str {
        "unmapped"
    }
}

impl ReadableRecord for Unmapped {
    fn columns() -> &'static [&'static str] {
        &[]
    }

    fn scan(&mut self, _row: &mut dyn RowScanner) -> Result<(), Error> {
        Ok(())
    }
}
