use crate::value::Value;
use std::fmt;
use thiserror::Error as ThisError;

/// Boxed failure reported by a connection collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

///
/// Error
///
/// Runtime error taxonomy.
/// `NoRows` is a condition rather than a defect and is never wrapped.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid output container {record}: {reason}")]
    InvalidOutput { record: &'static str, reason: String },

    #[error("invalid record {record}: {reason}")]
    InvalidRecord { record: &'static str, reason: String },

    #[error("no rows in result set")]
    NoRows,

    #[error("{op}: {source} (query={query:?} args={})", Args(.args))]
    Execution {
        op: &'static str,
        query: String,
        args: Vec<Value>,
        #[source]
        source: Box<Self>,
    },

    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("driver error: {0}")]
    Driver(#[source] BoxError),
}

impl Error {
    /// Wrap an arbitrary collaborator failure.
    pub fn driver(err: impl Into<BoxError>) -> Self {
        Self::Driver(err.into())
    }

    #[must_use]
    pub const fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Attach statement context to a failure.
    /// `NoRows` passes through untouched.
    pub(crate) fn execution(self, op: &'static str, query: &str, args: &[Value]) -> Self {
        match self {
            Self::NoRows => Self::NoRows,
            source => Self::Execution {
                op,
                query: query.to_string(),
                args: args.to_vec(),
                source: Box::new(source),
            },
        }
    }
}

///
/// ScanError
///
/// Failure while reading a row into typed temporaries.
///

#[derive(Debug, ThisError)]
pub enum ScanError {
    #[error("row has {found} columns, expected {expected}")]
    Width { expected: usize, found: usize },

    #[error("column {index} ({column}): cannot decode {found} as {expected}")]
    Decode {
        index: usize,
        column: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Failed(#[source] Box<Error>),
}

/// Renders an argument list the way it is bound: `[1, "a", NULL]`.
struct Args<'a>(&'a [Value]);

impl fmt::Display for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str("]")
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
