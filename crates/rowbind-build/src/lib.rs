//! Offline half of rowbind: reads record definitions from Rust source,
//! extracts table metadata and emits `Record`/`ReadableRecord`/
//! `WritableRecord` impls for the runtime crate.

mod config;
mod emit;
mod error;
mod extract;
mod format;
mod macros;

pub mod table;
pub mod tag;

pub use config::{Config, RecordConfig, run};
pub use error::Error;
pub use format::{FormatterKind, Passthrough, Rustfmt, SourceFormatter};
pub use table::{ColumnMode, FieldSpec, FieldStep, TableDescription};
pub use tag::{Tag, TagError};

use std::{collections::HashMap, fs, path::Path};

/// Header written at the top of every generated file.
pub const HEADER: &str = "// Code generated by rowbind-build. DO NOT EDIT.";

/// Annotation name used when none is configured.
pub const DEFAULT_TAG: &str = "db";

///
/// GeneratorConfig
///

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub tag: String,
    pub column_mode: ColumnMode,
    pub formatter: FormatterKind,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            column_mode: ColumnMode::default(),
            formatter: FormatterKind::default(),
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub const fn with_column_mode(mut self, mode: ColumnMode) -> Self {
        self.column_mode = mode;
        self
    }

    #[must_use]
    pub const fn with_formatter(mut self, formatter: FormatterKind) -> Self {
        self.formatter = formatter;
        self
    }
}

///
/// Decl
///
/// A type declaration seen while parsing sources. Only structs keep their
/// definition; everything else is remembered by kind so shape errors can
/// name it.
///

#[derive(Clone, Debug)]
pub(crate) enum Decl {
    Struct(Box<syn::ItemStruct>),
    Other(&'static str),
}

///
/// Generator
///

#[derive(Clone, Debug, Default)]
pub struct Generator {
    config: GeneratorConfig,
    decls: HashMap<String, Decl>,
}

impl Generator {
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            decls: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Register every type declared in `source`, including inline modules.
    pub fn parse_source(&mut self, origin: &str, source: &str) -> Result<&mut Self, Error> {
        let file = syn::parse_file(source).map_err(|source| Error::Parse {
            origin: origin.to_string(),
            source,
        })?;
        self.register(&file.items);

        Ok(self)
    }

    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, Error> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        self.parse_source(&path.display().to_string(), &source)
    }

    fn register(&mut self, items: &[syn::Item]) {
        for item in items {
            let (ident, decl) = match item {
                syn::Item::Struct(s) => (&s.ident, Decl::Struct(Box::new(s.clone()))),
                syn::Item::Enum(e) => (&e.ident, Decl::Other("enum")),
                syn::Item::Union(u) => (&u.ident, Decl::Other("union")),
                syn::Item::Type(t) => (&t.ident, Decl::Other("type alias")),
                syn::Item::Mod(m) => {
                    if let Some((_, items)) = &m.content {
                        self.register(items);
                    }
                    continue;
                }
                _ => continue,
            };

            let name = ident.to_string();
            if self.decls.contains_key(&name) {
                log::warn!("type {name} declared more than once; keeping the first declaration");
                continue;
            }
            self.decls.insert(name, decl);
        }
    }

    pub(crate) fn decl(&self, name: &str) -> Option<&Decl> {
        self.decls.get(name)
    }

    /// Extract and emit in one step.
    pub fn generate(
        &self,
        ty: &str,
        module: &str,
        table: &str,
        output: impl AsRef<Path>,
    ) -> Result<TableDescription, Error> {
        let desc = self.extract(ty)?;
        self.emit(&desc, module, table, output)?;

        Ok(desc)
    }
}
