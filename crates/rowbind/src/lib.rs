//! Runtime for rowbind: record capability traits, the value model, the
//! placeholder expander and the query engine that drives a connection
//! collaborator with generated accessor code.

// public exports are one module level down
pub mod conn;
pub mod engine;
pub mod error;
pub mod placeholder;
pub mod record;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{Engine, delete, insert, select, select_row, update};
pub use error::{Error, Result, ScanError};
pub use placeholder::expand;
pub use record::{ReadableRecord, Record, WritableRecord, scan_row};
pub use value::{Blob, FieldValue, Value, any_present, decode};

#[cfg(feature = "derive")]
pub use rowbind_derive::Mapped;

///
/// Prelude
///
/// Everything generated accessor code refers to.
///

pub mod prelude {
    pub use crate::{
        conn::{Executable, Queryable, RowScanner},
        error::Error,
        record::{ReadableRecord, Record, WritableRecord, scan_row},
        value::{FieldValue, Value, any_present, decode},
    };
}
