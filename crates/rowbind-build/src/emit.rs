use crate::{
    Generator, HEADER,
    error::Error,
    format::SourceFormatter,
    table::{ColumnMode, FieldSpec, FieldStep, TableDescription},
};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use std::{fs, path::Path};

impl Generator {
    /// Render accessor impls for `desc`.
    ///
    /// `module` is the path of the module that declares the record (empty when
    /// the output is included next to it); `table` overrides the extracted
    /// table name when non-empty.
    pub fn render(&self, desc: &TableDescription, module: &str, table: &str) -> Result<String, Error> {
        let tokens = RecordEmitter::new(desc, module, table, self.config.column_mode)?.generate();

        Ok(format!("{HEADER}\n\n{tokens}\n"))
    }

    /// Render, format with the configured formatter and write to `output`.
    pub fn emit(
        &self,
        desc: &TableDescription,
        module: &str,
        table: &str,
        output: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let formatter = self.config.formatter.formatter();

        self.emit_with(desc, module, table, formatter.as_ref(), output)
    }

    pub fn emit_with(
        &self,
        desc: &TableDescription,
        module: &str,
        table: &str,
        formatter: &dyn SourceFormatter,
        output: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let output = output.as_ref();
        let source = formatter.format(&self.render(desc, module, table)?)?;

        let write = |result: std::io::Result<()>| {
            result.map_err(|source| Error::Write {
                path: output.to_path_buf(),
                source,
            })
        };
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            write(fs::create_dir_all(parent))?;
        }
        write(fs::write(output, source))?;
        log::debug!("wrote {} accessors to {}", desc.record, output.display());

        Ok(())
    }
}

///
/// RecordEmitter
///

struct RecordEmitter<'a> {
    desc: &'a TableDescription,
    record: syn::Path,
    table: String,
    mode: ColumnMode,
}

impl<'a> RecordEmitter<'a> {
    fn new(
        desc: &'a TableDescription,
        module: &str,
        table: &str,
        mode: ColumnMode,
    ) -> Result<Self, Error> {
        let module = module.trim().trim_end_matches("::");
        let path = if module.is_empty() {
            desc.record.clone()
        } else {
            format!("{module}::{}", desc.record)
        };
        let record = syn::parse_str(&path).map_err(|err| Error::TemplateRender {
            record: desc.record.clone(),
            reason: format!("invalid module path `{module}`: {err}"),
        })?;

        let table = if table.is_empty() { desc.table.as_str() } else { table };
        if table.is_empty() {
            return Err(Error::TemplateRender {
                record: desc.record.clone(),
                reason: "empty table name".to_string(),
            });
        }

        Ok(Self {
            desc,
            record,
            table: table.to_string(),
            mode,
        })
    }

    fn generate(&self) -> TokenStream {
        let mut tokens = quote!();

        tokens.extend(self.record_impl());
        tokens.extend(self.readable_impl());
        tokens.extend(self.writable_impl());

        tokens
    }

    fn record_impl(&self) -> TokenStream {
        let record = &self.record;
        let table = &self.table;

        quote! {
            impl ::rowbind::Record for #record {
                fn table() -> &'static str {
                    #table
                }
            }
        }
    }

    fn readable_impl(&self) -> TokenStream {
        let record = &self.record;
        let fields: Vec<&FieldSpec> = self.desc.fields().collect();
        let width = fields.len();

        let columns = fields.iter().map(|f| match self.mode {
            ColumnMode::Plain => f.column.clone(),
            ColumnMode::Qualified => format!("{}.{}", self.table, f.column),
        });
        let args: Vec<Ident> = (0..width).map(|i| format_ident!("arg{i}")).collect();
        let parents = optional_parents(&fields);
        let flags: Vec<Ident> = (0..parents.len()).map(|i| format_ident!("present{i}")).collect();

        // a parent is present when any column beneath it is non-NULL
        let presence = parents.iter().zip(&flags).map(|(parent, flag)| {
            let indices = &parent.indices;

            quote!(let #flag = ::rowbind::any_present(&values, &[#(#indices),*]);)
        });

        // every column is decoded before the first assignment
        let decodes = fields.iter().zip(&args).enumerate().map(|(i, (f, arg))| {
            let column = &f.column;
            let decode = quote!(::rowbind::decode(&values, #i, #column)?);

            match innermost_parent(&parents, &f.path) {
                Some(p) => {
                    let flag = &flags[p];
                    quote! {
                        let #arg = if #flag {
                            ::std::option::Option::Some(#decode)
                        } else {
                            ::std::option::Option::None
                        };
                    }
                }
                None => quote!(let #arg = #decode;),
            }
        });

        // deepest first, so an absent outer parent is cleared last
        let resets = parents.iter().zip(&flags).rev().map(|(parent, flag)| {
            let target = write_target(parent.prefix);

            quote! {
                if !#flag {
                    #target = ::std::option::Option::None;
                }
            }
        });
        let assigns = fields.iter().zip(&args).map(|(f, arg)| {
            let target = write_target(&f.path);

            if innermost_parent(&parents, &f.path).is_some() {
                quote! {
                    if let ::std::option::Option::Some(value) = #arg {
                        #target = value;
                    }
                }
            } else {
                quote!(#target = #arg;)
            }
        });

        quote! {
            impl ::rowbind::ReadableRecord for #record {
                fn columns() -> &'static [&'static str] {
                    &[#(#columns),*]
                }

                fn scan(
                    &mut self,
                    row: &mut dyn ::rowbind::conn::RowScanner,
                ) -> ::std::result::Result<(), ::rowbind::Error> {
                    let values = ::rowbind::scan_row(row, #width)?;
                    #(#presence)*
                    #(#decodes)*

                    #(#resets)*
                    #(#assigns)*

                    Ok(())
                }
            }
        }
    }

    fn writable_impl(&self) -> TokenStream {
        let record = &self.record;
        let primary_keys = self.desc.primary.iter().map(|f| &f.column);
        let primary_values = self.desc.primary.iter().map(|f| read_value(&f.path));
        let value_columns = self.desc.values.iter().map(|f| &f.column);
        let values = self.desc.values.iter().map(|f| read_value(&f.path));

        let auto_increment = match &self.desc.auto_increment {
            Some(column) => quote!(::std::option::Option::Some(#column)),
            None => quote!(::std::option::Option::None),
        };

        quote! {
            impl ::rowbind::WritableRecord for #record {
                fn primary_keys() -> &'static [&'static str] {
                    &[#(#primary_keys),*]
                }

                fn primary_values(&self) -> ::std::vec::Vec<::rowbind::Value> {
                    ::std::vec![#(#primary_values),*]
                }

                fn value_columns() -> &'static [&'static str] {
                    &[#(#value_columns),*]
                }

                fn values(&self) -> ::std::vec::Vec<::rowbind::Value> {
                    ::std::vec![#(#values),*]
                }

                fn auto_increment_column() -> ::std::option::Option<&'static str> {
                    #auto_increment
                }
            }
        }
    }
}

fn step_ident(step: &FieldStep) -> Ident {
    format_ident!("{}", step.ident)
}

///
/// OptionalParent
///
/// An `Option<Nested>` prefix shared by one or more fields, with the row
/// slots of every column read beneath it.
///

struct OptionalParent<'f> {
    prefix: &'f [FieldStep],
    indices: Vec<usize>,
}

// optional_parents
// outermost first; an inner prefix always follows the prefixes containing it
fn optional_parents<'f>(fields: &[&'f FieldSpec]) -> Vec<OptionalParent<'f>> {
    let mut parents: Vec<OptionalParent<'f>> = Vec::new();

    for (index, &field) in fields.iter().enumerate() {
        let parent_len = field.path.len().saturating_sub(1);

        for (i, step) in field.path[..parent_len].iter().enumerate() {
            if !step.optional {
                continue;
            }

            let prefix = &field.path[..=i];
            match parents.iter_mut().find(|p| p.prefix == prefix) {
                Some(parent) => parent.indices.push(index),
                None => parents.push(OptionalParent {
                    prefix,
                    indices: vec![index],
                }),
            }
        }
    }
    parents.sort_by_key(|p| p.prefix.len());

    parents
}

// innermost_parent
// the deepest optional prefix above a field; it is present only when
// every optional prefix above it is
fn innermost_parent(parents: &[OptionalParent<'_>], path: &[FieldStep]) -> Option<usize> {
    let (_, above) = path.split_last()?;

    parents
        .iter()
        .enumerate()
        .filter(|(_, p)| above.starts_with(p.prefix))
        .max_by_key(|(_, p)| p.prefix.len())
        .map(|(i, _)| i)
}

// write_target
// place expression for a field; optional parents are created on demand
fn write_target(path: &[FieldStep]) -> TokenStream {
    let mut place = quote!(self);

    for (i, step) in path.iter().enumerate() {
        let ident = step_ident(step);
        place = quote!(#place.#ident);

        if step.optional && i + 1 < path.len() {
            place = quote!(#place.get_or_insert_with(::std::default::Default::default));
        }
    }

    place
}

// read_value
// `Value` expression for a field; an absent optional parent reads as NULL
fn read_value(path: &[FieldStep]) -> TokenStream {
    enum Access {
        Place(TokenStream),
        Maybe(TokenStream),
    }

    let Some((leaf, parents)) = path.split_last() else {
        return quote!(::rowbind::Value::Null);
    };

    let mut access = Access::Place(quote!(self));
    for step in parents {
        let ident = step_ident(step);
        access = match (access, step.optional) {
            (Access::Place(p), false) => Access::Place(quote!(#p.#ident)),
            (Access::Place(p), true) => Access::Maybe(quote!(#p.#ident.as_ref())),
            (Access::Maybe(m), false) => Access::Maybe(quote!(#m.map(|v| &v.#ident))),
            (Access::Maybe(m), true) => Access::Maybe(quote!(#m.and_then(|v| v.#ident.as_ref()))),
        };
    }

    let leaf = step_ident(leaf);
    match access {
        Access::Place(p) => quote!(::rowbind::FieldValue::to_value(&#p.#leaf)),
        Access::Maybe(m) => quote! {
            #m.map_or(::rowbind::Value::Null, |v| ::rowbind::FieldValue::to_value(&v.#leaf))
        },
    }
}
