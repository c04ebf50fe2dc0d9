//! Mapping annotation grammar: `column[,flag...]` or `-`.

use std::str::FromStr;
use thiserror::Error as ThisError;

/// Column name that excludes a field from mapping.
pub const SKIP: &str = "-";

pub const FLAG_PRIMARY: &str = "primary";
pub const FLAG_AUTO_INCREMENT: &str = "auto_increment";

///
/// TagError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TagError {
    #[error("empty flag in annotation {0:?}")]
    EmptyFlag(String),

    #[error("unknown flag {flag:?}, expected `primary` or `auto_increment`")]
    UnknownFlag { flag: String },

    #[error("skipped field cannot carry flags")]
    FlaggedSkip,

    #[error("annotation must be a string literal, as in `#[db = \"column\"]`")]
    NotAString,
}

///
/// Tag
///
/// A parsed annotation. `column` is `None` when the annotation leaves the
/// name to the default naming rule (`",primary"`).
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tag {
    pub column: Option<String>,
    pub primary: bool,
    pub auto_increment: bool,
    pub skip: bool,
}

impl Tag {
    pub fn parse(raw: &str) -> Result<Self, TagError> {
        let raw = raw.trim();
        let mut parts = raw.split(',').map(str::trim);
        let column = parts.next().unwrap_or_default();

        let mut tag = Self::default();
        let mut flagged = false;

        for flag in parts {
            flagged = true;
            match flag {
                FLAG_PRIMARY => tag.primary = true,
                FLAG_AUTO_INCREMENT => tag.auto_increment = true,
                "" => return Err(TagError::EmptyFlag(raw.to_string())),
                other => {
                    return Err(TagError::UnknownFlag {
                        flag: other.to_string(),
                    });
                }
            }
        }

        if column == SKIP {
            if flagged {
                return Err(TagError::FlaggedSkip);
            }
            tag.skip = true;
        } else if !column.is_empty() {
            tag.column = Some(column.to_string());
        }

        Ok(tag)
    }
}

impl FromStr for Tag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
