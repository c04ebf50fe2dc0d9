use crate::error::Error;
use serde::Deserialize;
use std::{
    ffi::OsString,
    io::Write,
    process::{Command, Stdio},
};

///
/// SourceFormatter
///
/// Last step before generated source hits the disk.
///

pub trait SourceFormatter {
    fn format(&self, source: &str) -> Result<String, Error>;
}

///
/// Passthrough
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl SourceFormatter for Passthrough {
    fn format(&self, source: &str) -> Result<String, Error> {
        Ok(source.to_string())
    }
}

///
/// Rustfmt
///
/// Pipes the source through an external `rustfmt`. The binary honours the
/// `RUSTFMT` environment variable the same way cargo does.
///

#[derive(Clone, Debug)]
pub struct Rustfmt {
    pub binary: OsString,
    pub edition: String,
}

impl Default for Rustfmt {
    fn default() -> Self {
        Self {
            binary: std::env::var_os("RUSTFMT").unwrap_or_else(|| "rustfmt".into()),
            edition: "2024".to_string(),
        }
    }
}

impl SourceFormatter for Rustfmt {
    fn format(&self, source: &str) -> Result<String, Error> {
        let mut child = Command::new(&self.binary)
            .args(["--edition", self.edition.as_str(), "--emit", "stdout", "--quiet"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| Error::Format(format!("cannot run {}: {err}", self.binary.display())))?;

        child
            .stdin
            .take()
            .ok_or_else(|| Error::Format("rustfmt stdin unavailable".to_string()))?
            .write_all(source.as_bytes())
            .map_err(|err| Error::Format(err.to_string()))?;

        let output = child
            .wait_with_output()
            .map_err(|err| Error::Format(err.to_string()))?;
        if !output.status.success() {
            return Err(Error::Format(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        String::from_utf8(output.stdout).map_err(|err| Error::Format(err.to_string()))
    }
}

///
/// FormatterKind
///
/// Configuration-level formatter choice.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FormatterKind {
    #[default]
    None,
    Rustfmt,
}

impl FormatterKind {
    #[must_use]
    pub fn formatter(self) -> Box<dyn SourceFormatter> {
        match self {
            Self::None => Box::new(Passthrough),
            Self::Rustfmt => Box::new(Rustfmt::default()),
        }
    }
}
