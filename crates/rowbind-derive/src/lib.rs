//! Derive support for rowbind records.

use proc_macro::TokenStream;

mod mapped;

/// Registers the `db` field attribute and checks every annotation at
/// compile time. Accessor impls come from `rowbind-build`.
#[proc_macro_derive(Mapped, attributes(db))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    mapped::derive_mapped(input.into()).into()
}
