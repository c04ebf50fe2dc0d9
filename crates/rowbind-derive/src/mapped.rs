use proc_macro2::TokenStream;
use quote::quote;
use rowbind_build::{DEFAULT_TAG, Tag, TagError};
use syn::{Data, DeriveInput, Error, Expr, ExprLit, Fields, Lit, Meta};

// derive_mapped
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match check(&input) {
        Ok(()) => quote!(),
        Err(err) => err.to_compile_error(),
    }
}

fn check(input: &DeriveInput) -> Result<(), Error> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Mapped can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "Mapped can only be derived for structs with named fields",
            ));
        }
    };

    let mut errors: Option<Error> = None;
    let mut push = |err: Error| match &mut errors {
        Some(errors) => errors.combine(err),
        None => errors = Some(err),
    };

    for field in fields {
        let mut seen = false;

        for attr in field.attrs.iter().filter(|a| a.path().is_ident(DEFAULT_TAG)) {
            if seen {
                push(Error::new_spanned(attr, "duplicate `db` annotation"));
                continue;
            }
            seen = true;

            let Meta::NameValue(nv) = &attr.meta else {
                push(Error::new_spanned(attr, "expected `#[db = \"column[,flag...]\"]`"));
                continue;
            };
            let Expr::Lit(ExprLit {
                lit: Lit::Str(raw), ..
            }) = &nv.value
            else {
                push(Error::new_spanned(&nv.value, TagError::NotAString));
                continue;
            };

            if let Err(err) = Tag::parse(&raw.value()) {
                push(Error::new_spanned(raw, err));
            }
        }
    }

    errors.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: TokenStream) -> String {
        derive_mapped(input).to_string()
    }

    #[test]
    fn valid_annotations_expand_to_nothing() {
        let out = expand(quote! {
            struct Person {
                #[db = "id,primary,auto_increment"]
                pub id: i64,
                #[db = "-"]
                pub cache: String,
                pub name: String,
            }
        });

        assert!(out.is_empty());
    }

    #[test]
    fn unknown_flag_is_a_compile_error() {
        let out = expand(quote! {
            struct Person {
                #[db = "id,primray"]
                pub id: i64,
            }
        });

        assert!(out.contains("compile_error"));
        assert!(out.contains("primray"));
    }

    #[test]
    fn every_bad_annotation_is_reported() {
        let out = expand(quote! {
            struct Person {
                #[db(id)]
                pub id: i64,
                #[db = 5]
                pub name: String,
            }
        });

        assert_eq!(out.matches("compile_error").count(), 2);
    }

    #[test]
    fn enums_are_rejected() {
        let out = expand(quote! {
            enum Shape { Circle }
        });

        assert!(out.contains("named fields"));
    }
}
