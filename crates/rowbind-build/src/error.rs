use crate::tag::TagError;
use std::{io, path::PathBuf};
use thiserror::Error as ThisError;

///
/// Error
///
/// Offline failures: reading sources, extracting metadata and emitting code.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: syn::Error,
    },

    #[error("invalid shape for `{ty}`: {reason}")]
    InvalidShape { ty: String, reason: String },

    #[error("invalid annotation on {record}.{field}: {source}")]
    InvalidTag {
        record: String,
        field: String,
        #[source]
        source: TagError,
    },

    #[error("failed to render {record}: {reason}")]
    TemplateRender { record: String, reason: String },

    #[error("failed to format generated source: {0}")]
    Format(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn invalid_shape(ty: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            ty: ty.into(),
            reason: reason.into(),
        }
    }
}
