use crate::{
    Decl, Generator,
    error::Error,
    table::{FieldSpec, FieldStep, TableDescription},
    tag::{Tag, TagError},
};
use convert_case::{Case, Casing};
use syn::{
    Expr, ExprLit, Fields, GenericArgument, Lit, Meta, PathArguments, Type, Visibility,
    ext::IdentExt,
};

#[derive(Default)]
struct Partitions {
    primary: Vec<FieldSpec>,
    values: Vec<FieldSpec>,
    auto_increment: Option<String>,
}

impl Generator {
    /// Derive the table description for `ty`.
    ///
    /// `ty` is Rust type syntax naming a parsed struct; one level of `&`,
    /// `&mut` or `Box` is looked through.
    pub fn extract(&self, ty: &str) -> Result<TableDescription, Error> {
        let parsed: Type =
            syn::parse_str(ty).map_err(|err| Error::invalid_shape(ty, err.to_string()))?;
        let name = record_name(deref(&parsed))
            .ok_or_else(|| Error::invalid_shape(ty, "not a named struct type"))?;
        let item = self.record(&name)?;

        let mut parts = Partitions::default();
        let mut stack = vec![name.clone()];
        self.walk(item, &[], &mut parts, &mut stack)?;

        if parts.primary.is_empty() {
            if parts.values.is_empty() {
                log::warn!("{name} has no mapped fields; generated statements will be malformed");
            } else {
                let first = parts.values.remove(0);
                log::warn!(
                    "{name} has no primary column; using first column `{}` as primary",
                    first.column
                );
                parts.primary.push(first);
            }
        }

        Ok(TableDescription {
            table: name.to_case(Case::Snake),
            record: name,
            primary: parts.primary,
            values: parts.values,
            auto_increment: parts.auto_increment,
        })
    }

    // record
    // a non-generic struct with named fields
    fn record(&self, name: &str) -> Result<&syn::ItemStruct, Error> {
        match self.decl(name) {
            Some(Decl::Struct(item)) => {
                let item: &syn::ItemStruct = item;
                if !item.generics.params.is_empty() {
                    return Err(Error::invalid_shape(name, "generic structs are not supported"));
                }
                match item.fields {
                    Fields::Named(_) => Ok(item),
                    Fields::Unnamed(_) => Err(Error::invalid_shape(name, "tuple struct")),
                    Fields::Unit => Err(Error::invalid_shape(name, "unit struct")),
                }
            }
            Some(Decl::Other(kind)) => Err(Error::invalid_shape(name, *kind)),
            None => Err(Error::invalid_shape(name, "unknown type")),
        }
    }

    // nested
    // the struct an unannotated field recurses into, if any
    fn nested(&self, ty: &Type) -> Option<(String, &syn::ItemStruct, bool)> {
        let (inner, optional) = match option_inner(ty) {
            Some(inner) => (inner, true),
            None => (ty, false),
        };
        let name = record_name(inner)?;
        let item = self.record(&name).ok()?;

        Some((name, item, optional))
    }

    fn walk(
        &self,
        item: &syn::ItemStruct,
        prefix: &[FieldStep],
        parts: &mut Partitions,
        stack: &mut Vec<String>,
    ) -> Result<(), Error> {
        let record = item.ident.to_string();

        for field in &item.fields {
            if matches!(field.vis, Visibility::Inherited) {
                continue;
            }
            let Some(ident) = &field.ident else {
                continue;
            };

            let tag = self
                .annotation(field)
                .map_err(|source| Error::InvalidTag {
                    record: record.clone(),
                    field: ident.to_string(),
                    source,
                })?;
            if tag.as_ref().is_some_and(|tag| tag.skip) {
                continue;
            }

            let mut path = prefix.to_vec();
            path.push(FieldStep::new(ident.to_string()));

            if tag.is_none()
                && let Some((nested, nested_item, optional)) = self.nested(&field.ty)
            {
                if stack.contains(&nested) {
                    return Err(Error::invalid_shape(
                        &stack[0],
                        format!("{record}.{ident} embeds {nested} recursively"),
                    ));
                }
                if let Some(step) = path.last_mut() {
                    step.optional = optional;
                }

                stack.push(nested);
                self.walk(nested_item, &path, parts, stack)?;
                stack.pop();
                continue;
            }

            if is_sequence(&field.ty) {
                return Err(Error::invalid_shape(
                    &stack[0],
                    format!("{record}.{ident} is a sequence and cannot be a column; use Blob for binary data"),
                ));
            }

            let tag = tag.unwrap_or_default();
            let column = tag
                .column
                .unwrap_or_else(|| ident.unraw().to_string().to_case(Case::Snake));

            if tag.auto_increment && parts.auto_increment.is_none() {
                parts.auto_increment = Some(column.clone());
            }

            let spec = FieldSpec {
                path,
                column,
                ty: field.ty.clone(),
                primary: tag.primary,
                auto_increment: tag.auto_increment,
            };
            if spec.primary {
                parts.primary.push(spec);
            } else {
                parts.values.push(spec);
            }
        }

        Ok(())
    }

    // annotation
    // `#[<tag> = "..."]`; an empty string counts as no annotation
    fn annotation(&self, field: &syn::Field) -> Result<Option<Tag>, TagError> {
        let Some(attr) = field
            .attrs
            .iter()
            .find(|attr| attr.path().is_ident(&self.config.tag))
        else {
            return Ok(None);
        };

        let Meta::NameValue(nv) = &attr.meta else {
            return Err(TagError::NotAString);
        };
        let Expr::Lit(ExprLit {
            lit: Lit::Str(raw), ..
        }) = &nv.value
        else {
            return Err(TagError::NotAString);
        };

        let raw = raw.value();
        if raw.trim().is_empty() {
            return Ok(None);
        }

        Tag::parse(&raw).map(Some)
    }
}

// deref
// looks through one level of `&`, `&mut` or `Box<_>`
fn deref(ty: &Type) -> &Type {
    match ty {
        Type::Reference(r) => &r.elem,
        Type::Paren(p) => deref(&p.elem),
        _ => single_generic(ty, "Box").unwrap_or(ty),
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    single_generic(ty, "Option")
}

// single_generic
// `Wrapper<T>` → `T` when the last path segment is `wrapper`
fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(tp) = ty else {
        return None;
    };
    if tp.qself.is_some() {
        return None;
    }
    let seg = tp.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

// is_sequence
// `Vec<T>`, `[T; N]` or `&[T]`, optionally inside `Option`; these bind as
// lists and would be fanned out by the placeholder expander
fn is_sequence(ty: &Type) -> bool {
    let ty = option_inner(ty).unwrap_or(ty);
    let ty = match ty {
        Type::Reference(r) => &r.elem,
        _ => ty,
    };

    matches!(ty, Type::Array(_) | Type::Slice(_)) || single_generic(ty, "Vec").is_some()
}

// record_name
// last segment of a plain path type without generic arguments
fn record_name(ty: &Type) -> Option<String> {
    let Type::Path(tp) = ty else {
        return None;
    };
    if tp.qself.is_some() {
        return None;
    }
    let seg = tp.path.segments.last()?;
    if !seg.arguments.is_none() {
        return None;
    }

    Some(seg.ident.to_string())
}

#[cfg(test)]
mod tests {
    use crate::{Error, Generator, GeneratorConfig, TagError};
    use proptest::prelude::*;
    use syn::parse_quote;

    const MODEL: &str = r#"
        pub struct Person {
            #[db = "id,primary,auto_increment"]
            pub id: i64,
            pub name: String,
            #[db = "created_at"]
            pub created_at: PrimitiveDateTime,
        }

        pub struct Audit {
            pub created_by: String,
            pub updated_by: Option<String>,
        }

        pub struct Stamp {
            pub stamped_at: i64,
        }

        pub struct Document {
            #[db = "doc_id,primary"]
            pub id: i64,
            pub title: String,
            pub audit: Audit,
            pub stamp: Option<Stamp>,
            pub body: Body,
        }

        pub struct Body(pub String);

        pub struct NoKey {
            pub first_name: String,
            pub last_name: String,
        }

        pub struct Hidden {
            #[db = "-"]
            pub cache: String,
            secret: String,
            pub(crate) visible: i32,
            pub r#type: String,
        }

        pub struct Tree {
            pub id: i64,
            pub parent: Option<Node>,
        }

        pub struct Node {
            pub tree: Tree,
        }

        pub struct Tagged {
            #[db = "audit_blob"]
            pub audit: Audit,
        }

        pub struct Bad {
            #[db = "id,primray"]
            pub id: i64,
        }

        pub struct Generic<T> {
            pub value: T,
        }

        pub enum Shape { Circle, Square }

        pub struct Composite {
            #[db = "group_id,primary"]
            pub group: i64,
            #[db = "user_id,primary"]
            pub user: i64,
            #[db = ",auto_increment"]
            pub seq: i64,
            #[db = "other,auto_increment"]
            pub other: i64,
        }

        pub struct Listed {
            pub id: i64,
            pub tags: Option<Vec<String>>,
        }

        pub struct Odd {
            #[db(id)]
            pub id: i64,
        }

        pub struct Numbered {
            #[db = 5]
            pub id: i64,
        }

        mod nested {
            pub struct Inner {
                pub inner_id: i64,
            }
        }
    "#;

    fn generator() -> Generator {
        let mut generator = Generator::new(GeneratorConfig::default());
        generator.parse_source("model.rs", MODEL).unwrap();
        generator
    }

    fn columns(fields: &[crate::FieldSpec]) -> Vec<&str> {
        fields.iter().map(|f| f.column.as_str()).collect()
    }

    #[test]
    fn annotated_record() {
        let desc = generator().extract("Person").unwrap();

        assert_eq!(desc.record, "Person");
        assert_eq!(desc.table, "person");
        assert_eq!(columns(&desc.primary), ["id"]);
        assert_eq!(columns(&desc.values), ["name", "created_at"]);
        assert_eq!(desc.auto_increment.as_deref(), Some("id"));
        let ty: syn::Type = parse_quote!(PrimitiveDateTime);
        assert_eq!(desc.values[1].ty, ty);
    }

    #[test]
    fn references_and_boxes_are_looked_through() {
        let generator = generator();
        let expected = generator.extract("Person").unwrap();

        for ty in ["&Person", "&mut Person", "Box<Person>", "crate::model::Person"] {
            assert_eq!(generator.extract(ty).unwrap(), expected, "{ty}");
        }
    }

    #[test]
    fn embedded_records_are_spliced_in_place() {
        let desc = generator().extract("Document").unwrap();

        assert_eq!(columns(&desc.primary), ["doc_id"]);
        assert_eq!(
            columns(&desc.values),
            ["title", "created_by", "updated_by", "stamped_at", "body"]
        );
        assert_eq!(desc.values[1].accessor(), "audit.created_by");

        let stamped = &desc.values[3];
        assert_eq!(stamped.accessor(), "stamp.stamped_at");
        assert!(stamped.path[0].optional);
        assert!(!stamped.path[1].optional);
    }

    #[test]
    fn annotated_struct_field_is_a_leaf() {
        let desc = generator().extract("Tagged").unwrap();

        assert_eq!(columns(&desc.primary), ["audit_blob"]);
        assert!(desc.values.is_empty());
    }

    #[test]
    fn first_value_is_promoted_without_primary() {
        let desc = generator().extract("NoKey").unwrap();

        assert_eq!(columns(&desc.primary), ["first_name"]);
        assert_eq!(columns(&desc.values), ["last_name"]);
    }

    #[test]
    fn skipped_and_private_fields_are_dropped() {
        let desc = generator().extract("Hidden").unwrap();

        assert_eq!(columns(&desc.primary), ["visible"]);
        assert_eq!(columns(&desc.values), ["type"]);
        assert_eq!(desc.values[0].accessor(), "r#type");
    }

    #[test]
    fn composite_keys_and_first_auto_increment_wins() {
        let desc = generator().extract("Composite").unwrap();

        assert_eq!(columns(&desc.primary), ["group_id", "user_id"]);
        assert_eq!(columns(&desc.values), ["seq", "other"]);
        assert_eq!(desc.auto_increment.as_deref(), Some("seq"));
        assert!(desc.values[1].auto_increment);
    }

    #[test]
    fn inline_modules_are_registered() {
        let desc = generator().extract("Inner").unwrap();
        assert_eq!(columns(&desc.primary), ["inner_id"]);
    }

    #[test]
    fn custom_tag_name() {
        let mut generator = Generator::new(GeneratorConfig::default().with_tag("sql"));
        generator
            .parse_source(
                "model.rs",
                r#"pub struct User { #[sql = "user_id,primary"] pub id: i64, #[db = "ignored"] pub name: String }"#,
            )
            .unwrap();

        let desc = generator.extract("User").unwrap();
        assert_eq!(columns(&desc.primary), ["user_id"]);
        assert_eq!(columns(&desc.values), ["name"]);
    }

    #[test]
    fn invalid_shapes() {
        let generator = generator();

        for ty in ["Shape", "Body", "Generic<i64>", "Generic", "Missing", "(i64, i64)", "[Person]"] {
            assert!(
                matches!(generator.extract(ty), Err(Error::InvalidShape { .. })),
                "{ty}"
            );
        }
    }

    #[test]
    fn cycles_are_reported() {
        let err = generator().extract("Tree").unwrap_err();
        assert!(matches!(err, Error::InvalidShape { ref ty, .. } if ty == "Tree"));
    }

    #[test]
    fn sequence_fields_are_not_columns() {
        let err = generator().extract("Listed").unwrap_err();
        assert!(matches!(err, Error::InvalidShape { ref ty, ref reason } if ty == "Listed" && reason.contains("Listed.tags")));
    }

    #[test]
    fn non_string_annotations_fail_extraction() {
        let generator = generator();

        for ty in ["Odd", "Numbered"] {
            assert!(
                matches!(
                    generator.extract(ty),
                    Err(Error::InvalidTag {
                        source: TagError::NotAString,
                        ..
                    })
                ),
                "{ty}"
            );
        }
    }

    #[test]
    fn bad_flags_fail_extraction() {
        let err = generator().extract("Bad").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTag {
                source: TagError::UnknownFlag { .. },
                ..
            }
        ));
    }

    // ---- properties ----------------------------------------------------

    #[derive(Clone, Copy, Debug)]
    enum Kind {
        Plain,
        Primary,
        Skipped,
        Private,
    }

    fn kind() -> impl Strategy<Value = Kind> {
        prop_oneof![
            Just(Kind::Plain),
            Just(Kind::Primary),
            Just(Kind::Skipped),
            Just(Kind::Private),
        ]
    }

    // col_a, col_b, ...; digits would be split by snake-casing
    fn field_name(i: usize) -> String {
        format!("col_{}", char::from(b'a' + u8::try_from(i).unwrap()))
    }

    fn source(kinds: &[Kind]) -> String {
        let fields: String = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let name = field_name(i);
                match kind {
                    Kind::Plain => format!("pub {name}: i64,"),
                    Kind::Primary => format!("#[db = \"{name},primary\"] pub {name}: i64,"),
                    Kind::Skipped => format!("#[db = \"-\"] pub {name}: i64,"),
                    Kind::Private => format!("{name}: i64,"),
                }
            })
            .collect();

        format!("pub struct Random {{ {fields} }}")
    }

    proptest! {
        #[test]
        fn primary_is_never_empty_when_something_is_mapped(
            kinds in prop::collection::vec(kind(), 0..10),
        ) {
            let mut generator = Generator::new(GeneratorConfig::default());
            generator.parse_source("random.rs", &source(&kinds)).unwrap();
            let desc = generator.extract("Random").unwrap();

            let named = |keep: fn(Kind) -> bool| -> Vec<String> {
                kinds
                    .iter()
                    .enumerate()
                    .filter(|(_, kind)| keep(**kind))
                    .map(|(i, _)| field_name(i))
                    .collect()
            };
            let annotated = named(|k| matches!(k, Kind::Primary));
            let plain = named(|k| matches!(k, Kind::Plain));
            let mapped = named(|k| matches!(k, Kind::Plain | Kind::Primary));

            // `-` and private fields never reach a column list
            let mut all: Vec<String> = desc.fields().map(|f| f.column.clone()).collect();
            all.sort();
            let mut expected = mapped.clone();
            expected.sort();
            prop_assert_eq!(all, expected);

            let primary: Vec<String> = desc.primary.iter().map(|f| f.column.clone()).collect();
            let values: Vec<String> = desc.values.iter().map(|f| f.column.clone()).collect();
            if mapped.is_empty() {
                prop_assert!(primary.is_empty() && values.is_empty());
            } else if annotated.is_empty() {
                prop_assert_eq!(primary, vec![plain[0].clone()]);
                prop_assert_eq!(values, plain[1..].to_vec());
            } else {
                prop_assert_eq!(primary, annotated);
                prop_assert_eq!(values, plain);
            }
        }
    }
}
