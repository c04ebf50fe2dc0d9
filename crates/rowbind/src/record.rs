//! Capability contracts implemented by generated accessor code.
//!
//! A record type usually gets these impls from `rowbind-build`; writing them
//! by hand is fine as long as the parallel arrays stay in the same order.

use crate::{
    conn::RowScanner,
    error::{Error, ScanError},
    value::Value,
};

///
/// Record
///

pub trait Record {
    /// Table the record maps to.
    fn table() -> &'static str;
}

///
/// ReadableRecord
///
/// A record that can be rebuilt from a row whose columns are `columns()`,
/// in that order.
///

pub trait ReadableRecord: Record {
    /// Every mapped column: primary keys first, then values.
    fn columns() -> &'static [&'static str];

    /// Populate `self` from the current row.
    ///
    /// Implementations read every column before assigning any field, so a
    /// failed scan leaves the record untouched.
    fn scan(&mut self, row: &mut dyn RowScanner) -> Result<(), Error>;
}

///
/// WritableRecord
///
/// A record that can be inserted, updated and deleted by primary key.
/// `primary_keys`/`primary_values` and `value_columns`/`values` are parallel.
///

pub trait WritableRecord: Record {
    fn primary_keys() -> &'static [&'static str];

    fn primary_values(&self) -> Vec<Value>;

    fn value_columns() -> &'static [&'static str];

    fn values(&self) -> Vec<Value>;

    /// Column filled in by the database on insert, if any.
    fn auto_increment_column() -> Option<&'static str> {
        None
    }
}

/// Read `width` positional values from `row`.
///
/// `NoRows` and scan errors pass through unchanged; any other failure is
/// wrapped as an opaque scan failure.
pub fn scan_row(row: &mut dyn RowScanner, width: usize) -> Result<Vec<Value>, Error> {
    match row.scan(width) {
        Ok(values) if values.len() == width => Ok(values),
        Ok(values) => Err(ScanError::Width {
            expected: width,
            found: values.len(),
        }
        .into()),
        Err(err @ (Error::NoRows | Error::Scan(_))) => Err(err),
        Err(err) => Err(ScanError::Failed(Box::new(err)).into()),
    }
}
