//! Query engine.
//!
//! Builds statements from a record type's static metadata, routes them
//! through the placeholder expander and hands them to a connection
//! collaborator. `Engine` caches the statement text per record type; the
//! free functions rebuild it on every call.

mod plan;


pub use plan::{ReadPlan, Registry, WriteArgs, WritePlan};

use crate::{
    conn::{ExecResult, Executable, Queryable, Rows},
    error::Error,
    placeholder::expand,
    record::{ReadableRecord, WritableRecord},
    value::Value,
};
use std::any::type_name;

///
/// Engine
///

#[derive(Debug, Default)]
pub struct Engine {
    registry: Registry,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// `SELECT <columns> FROM <table> <fragment>`, appending one record per row to `out`.
    ///
    /// On a scan failure `out` keeps the rows read so far.
    pub fn select<C, R>(
        &self,
        ctx: &C::Context,
        conn: &C,
        out: &mut Vec<R>,
        fragment: &str,
        args: &[Value],
    ) -> Result<(), Error>
    where
        C: Queryable,
        R: ReadableRecord + Default + 'static,
    {
        let plan = self.registry.read_plan::<R>()?;

        select_with(&plan, ctx, conn, out, fragment, args)
    }

    /// Single-row select into `out`. A missing row is `Error::NoRows`.
    pub fn select_row<C, R>(
        &self,
        ctx: &C::Context,
        conn: &C,
        out: &mut R,
        fragment: &str,
        args: &[Value],
    ) -> Result<(), Error>
    where
        C: Queryable,
        R: ReadableRecord + 'static,
    {
        let plan = self.registry.read_plan::<R>()?;

        select_row_with(&plan, ctx, conn, out, fragment, args)
    }

    /// Insert `record`, returning the identifier the database assigned.
    pub fn insert<C, R>(&self, ctx: &C::Context, conn: &C, record: &R) -> Result<i64, Error>
    where
        C: Executable,
        R: WritableRecord + 'static,
    {
        let plan = self.registry.write_plan::<R>();

        insert_with(&plan, ctx, conn, record)
    }

    /// Update every value column of the row matching `record`'s primary key.
    pub fn update<C, R>(&self, ctx: &C::Context, conn: &C, record: &R) -> Result<(), Error>
    where
        C: Executable,
        R: WritableRecord + 'static,
    {
        let plan = self.registry.write_plan::<R>();

        update_with(&plan, ctx, conn, record)
    }

    /// Delete the row matching `record`'s primary key.
    pub fn delete<C, R>(&self, ctx: &C::Context, conn: &C, record: &R) -> Result<(), Error>
    where
        C: Executable,
        R: WritableRecord + 'static,
    {
        let plan = self.registry.write_plan::<R>();

        delete_with(&plan, ctx, conn, record)
    }
}

//
// Uncached entry points
//

pub fn select<C, R>(
    ctx: &C::Context,
    conn: &C,
    out: &mut Vec<R>,
    fragment: &str,
    args: &[Value],
) -> Result<(), Error>
where
    C: Queryable,
    R: ReadableRecord + Default,
{
    select_with(&ReadPlan::of::<R>()?, ctx, conn, out, fragment, args)
}

pub fn select_row<C, R>(
    ctx: &C::Context,
    conn: &C,
    out: &mut R,
    fragment: &str,
    args: &[Value],
) -> Result<(), Error>
where
    C: Queryable,
    R: ReadableRecord,
{
    select_row_with(&ReadPlan::of::<R>()?, ctx, conn, out, fragment, args)
}

pub fn insert<C, R>(ctx: &C::Context, conn: &C, record: &R) -> Result<i64, Error>
where
    C: Executable,
    R: WritableRecord,
{
    insert_with(&WritePlan::of::<R>(), ctx, conn, record)
}

pub fn update<C, R>(ctx: &C::Context, conn: &C, record: &R) -> Result<(), Error>
where
    C: Executable,
    R: WritableRecord,
{
    update_with(&WritePlan::of::<R>(), ctx, conn, record)
}

pub fn delete<C, R>(ctx: &C::Context, conn: &C, record: &R) -> Result<(), Error>
where
    C: Executable,
    R: WritableRecord,
{
    delete_with(&WritePlan::of::<R>(), ctx, conn, record)
}

//
// Shared bodies
//

fn select_with<C, R>(
    plan: &ReadPlan,
    ctx: &C::Context,
    conn: &C,
    out: &mut Vec<R>,
    fragment: &str,
    args: &[Value],
) -> Result<(), Error>
where
    C: Queryable,
    R: ReadableRecord + Default,
{
    let (query, args) = expand(&plan.statement(fragment), args);
    log::debug!("select: {query} {args:?}");

    let mut rows = conn
        .query_rows(ctx, &query, &args)
        .map_err(|err| fail("select", err, &query, &args))?;

    while rows
        .advance()
        .map_err(|err| fail("select", err, &query, &args))?
    {
        let mut record = R::default();
        record.scan(&mut rows)?;
        out.push(record);
    }

    Ok(())
}

fn select_row_with<C, R>(
    plan: &ReadPlan,
    ctx: &C::Context,
    conn: &C,
    out: &mut R,
    fragment: &str,
    args: &[Value],
) -> Result<(), Error>
where
    C: Queryable,
    R: ReadableRecord,
{
    let (query, args) = expand(&plan.statement(fragment), args);
    log::debug!("select_row: {query} {args:?}");

    let mut row = conn.query_row(ctx, &query, &args);

    out.scan(&mut row)
        .map_err(|err| fail("select_row", err, &query, &args))
}

fn insert_with<C, R>(plan: &WritePlan, ctx: &C::Context, conn: &C, record: &R) -> Result<i64, Error>
where
    C: Executable,
    R: WritableRecord,
{
    let values = plan.insert_args(WriteArgs::of(record)?);
    let (query, args) = expand(&plan.insert, &[Value::List(values)]);
    log::debug!("insert: {query} {args:?}");

    let result = conn
        .exec(ctx, &query, &args)
        .map_err(|err| fail("insert", err, &query, &args))?;

    result
        .last_insert_id()
        .map_err(|err| fail("insert", err, &query, &args))
}

fn update_with<C, R>(plan: &WritePlan, ctx: &C::Context, conn: &C, record: &R) -> Result<(), Error>
where
    C: Executable,
    R: WritableRecord,
{
    let update = plan
        .update
        .as_deref()
        .ok_or_else(|| unwritable::<R>("no value columns to update"))?;
    let (query, args) = expand(update, &WritePlan::update_args(WriteArgs::of(record)?));
    log::debug!("update: {query} {args:?}");

    conn.exec(ctx, &query, &args)
        .map(|_| ())
        .map_err(|err| fail("update", err, &query, &args))
}

fn delete_with<C, R>(plan: &WritePlan, ctx: &C::Context, conn: &C, record: &R) -> Result<(), Error>
where
    C: Executable,
    R: WritableRecord,
{
    let delete = plan
        .delete
        .as_deref()
        .ok_or_else(|| unwritable::<R>("no primary key"))?;
    let (query, args) = expand(delete, &WriteArgs::of(record)?.primary);
    log::debug!("delete: {query} {args:?}");

    conn.exec(ctx, &query, &args)
        .map(|_| ())
        .map_err(|err| fail("delete", err, &query, &args))
}

fn unwritable<R>(reason: &str) -> Error {
    Error::InvalidRecord {
        record: type_name::<R>(),
        reason: reason.to_string(),
    }
}

fn fail(op: &'static str, err: Error, query: &str, args: &[Value]) -> Error {
    if !err.is_no_rows() {
        log::warn!("{op} failed: {err}; query={query}");
    }

    err.execution(op, query, args)
}
