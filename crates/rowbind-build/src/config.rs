use crate::{
    DEFAULT_TAG, Generator, GeneratorConfig, error::Error, format::FormatterKind, table::ColumnMode,
};
use convert_case::{Case, Casing};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

///
/// Config
///
/// `rowbind.toml`:
///
/// ```toml
/// tag = "db"
/// column_mode = "plain"
/// formatter = "rustfmt"
/// sources = ["src/model.rs"]
///
/// [[record]]
/// type = "Person"
/// module = "crate::model"
/// ```
///

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default)]
    pub column_mode: ColumnMode,

    #[serde(default)]
    pub formatter: FormatterKind,

    #[serde(default)]
    pub sources: Vec<PathBuf>,

    #[serde(default, rename = "record")]
    pub records: Vec<RecordConfig>,
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

///
/// RecordConfig
///

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordConfig {
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub table: String,

    #[serde(default)]
    pub module: String,

    /// Output file name relative to the output directory.
    /// Defaults to `<snake_case type>.rs`.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl RecordConfig {
    #[must_use]
    pub fn output_file(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let name = self.ty.rsplit("::").next().unwrap_or(&self.ty);
            PathBuf::from(format!("{}.rs", name.to_case(Case::Snake)))
        })
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&s)
    }

    #[must_use]
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_tag(&self.tag)
            .with_column_mode(self.column_mode)
            .with_formatter(self.formatter)
    }
}

/// Generate every configured record.
///
/// Sources are resolved against `base_dir`, outputs against `out_dir`.
/// Returns the written files in configuration order.
pub fn run(config: &Config, base_dir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut generator = Generator::new(config.generator_config());
    for source in &config.sources {
        generator.parse_file(base_dir.join(source))?;
    }

    let mut written = Vec::with_capacity(config.records.len());
    for record in &config.records {
        let output = out_dir.join(record.output_file());
        generator.generate(&record.ty, &record.module, &record.table, &output)?;
        written.push(output);
    }

    Ok(written)
}
