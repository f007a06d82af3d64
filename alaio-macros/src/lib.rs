//! This crate contains the macros used by the `alaio` crates.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

#[cfg(feature = "detailed-error")]
use syn::ItemEnum;

mod attr;
mod serde;

#[cfg(feature = "detailed-error")]
mod error;


/// Add a `location` field to all variants of a `Snafu` error enum
///
/// This will add the `location` field to all variants, which need to be either
/// structs or the unit type (tuple variants are not allowed).
/// The location field will be automatically populated when using the error selector.
///
/// It will also update the display string (if defined) to also show the location
/// that has been captured.
///
/// **NOTE:** you cannot use a `whatever` variant in conjunction with this, nor can you
///           manually define the `location` field yourself (it will conflict with the
///           generated one).
#[proc_macro_attribute]
pub fn with_location(attr: TokenStream, annotated_item: TokenStream) -> TokenStream {
    with_location_impl(attr, annotated_item)
}

#[cfg(feature = "detailed-error")]
fn with_location_impl(_attr: TokenStream, annotated_item: TokenStream) -> TokenStream {
    let error_enum = parse_macro_input!(annotated_item as ItemEnum);
    error::add_location_to_error_enum(error_enum).into()
}

#[cfg(not(feature = "detailed-error"))]
fn with_location_impl(_attr: TokenStream, annotated_item: TokenStream) -> TokenStream {
    annotated_item
}


/// Implement the `alaio::BinarySerializable` and `alaio::ABIReflect` traits
///
/// On structs this walks all the fields in declaration order, both when
/// serializing and when contributing the equivalent ABI struct declaration.
/// On enums this encodes the variant as a `varuint32` discriminant followed
/// by the value, and contributes an ABI variant declaration.
#[proc_macro_derive(ABISerializable, attributes(serde))]
pub fn derive_abiserializable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    serde::derive(&input).into()
}

/// Implement the `serde::Serialize` and `serde::Deserialize` traits for a variant type
///
/// The Alaio wire conventions expect variant values in JSON to be encoded as a
/// tuple of `(discriminant, value)` which is not natively supported by `serde`,
/// so this macro fills in the gap and should be used instead of
/// `#[derive(Serialize, Deserialize)]` for enum types. By default the discriminant
/// is serialized as a `snake_case` string.
///
/// It exposes one attribute argument for variants which is `serde(rename)`.
#[proc_macro_derive(SerializeEnum, attributes(serde))]
pub fn derive_serialize_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    serde::derive_serialize_enum(&input).into()
}
