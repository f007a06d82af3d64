//!
//! This library provides data types and functions to convert between the
//! compact binary wire format used by Alaio contract namespaces and JSON,
//! driven by an ABI (a data schema declaring the structs, variants, aliases
//! and action/table mappings of a contract).
//!
//! The basic types can be found in the [`types`] module, and the variant type
//! used to represent any builtin value is [`AlaioValue`].
//!
//! # Feature flags
//!
//! - `cli`: whether to compile the command-line tools alongside the library.
//!          This feature is enabled by default and currently installs the
//!          `alaioconv` tool.
//! - `detailed-error`: activate this to enable the [`macro@with_location`]
//!                     macro. If not enabled, the [`macro@with_location`]
//!                     macro will be a no-op.
//!
//! # Data model
//!
//! Data handled by this library can be found in a variety of formats, namely:
//!  - Rust native data types (structs defined in this library or in client code)
//!  - JSON value (`serde_json::Value`)
//!  - JSON string representation
//!  - binary data
//!
//! Conversions between those formats are handled as follows:
//!  - most of the conversions between native values and JSON are done via the
//!    `serde::Serialize` and `serde::Deserialize` traits.
//!  - to convert between a JSON value and a binary stream you need an instance
//!    of the [`ABI`] class which has been initialized with a data schema
//!    ([`ABIDefinition`]).
//!  - to convert between a Rust native value and a binary stream you need the
//!    [`BinarySerializable`] trait, which you can automatically derive using
//!    the [`ABISerializable`](macro@ABISerializable) derive macro. The same
//!    derive also implements [`ABIReflect`], which lets a native type
//!    contribute its own declarations to an [`ABIDefinition`] and so take part
//!    in schema-driven conversions under its own name.
//!  - a whole contract namespace (several ABIs keyed by account name, plus the
//!    result buffers a C-style embedding needs) is managed by an
//!    [`AbiContext`].
//!
//! ## Warnings / pitfalls
//!
//!  - when defining your own types, if you have a bytes field make sure to use
//!    the [`Bytes`] type instead of `Vec<u8>` otherwise the JSON serialization
//!    will not be correct.
//!  - when defining a variant type using a Rust enum, you need to use the
//!    [`SerializeEnum`] derive macro instead of `serde::Serialize` and
//!    `serde::Deserialize`. This is because the discriminant needs to be
//!    encoded as a `(discriminant, value)` tuple which cannot be achieved
//!    with the stock `serde` derives.
//!
//! # `alaioconv` CLI tool
//!
//! The `alaioconv` tool provides JSON <> hex conversion functionality:
//! ```sh
//! $ alaioconv to-hex --abi token.abi transfer '{"from": "useraaaaaaaa", ...}'
//! $ alaioconv from-hex --abi token.abi transfer 608c31c6187315d6...
//! ```


// disable this lint to allow our types to implement a `from_str` constructor
// without implementing the `std::str::FromStr` trait
// if we didn't, we would have to import that trait everywhere we want to build
// our types, which wouldn't be very convenient and isn't very discoverable
#![allow(clippy::should_implement_trait)]

// this is needed to be able to use the `ABISerializable` derive macro from
// within this crate, as the generated code refers to the `alaio` crate
extern crate self as alaio;

pub mod abi;
pub mod abiserializable;
pub mod bytestream;
pub mod chain;
pub mod config;
pub mod convert;
pub mod json;
pub mod macros;
pub mod types;

pub use serde_json::{
    Map as JsonMap,
    Value as JsonValue,
    Error as JsonError,
    json
};

pub use types::*;
pub use chain::*;

pub use abi::{ABI, ABIDefinition, ABIError, ABIReflect, AbiContext, TypeNameRef};

pub use bytestream::{ByteStream, FixedBufStream, SizeStream, StreamError, StreamWriter};
pub use abiserializable::{BinarySerializable, SerializeError, from_bin, packed_size, to_bin, to_hex};

/// Add a `location` field to all variants of a `Snafu` error enum
///
/// This will add the `location` field to all variants, which need to be either
/// structs or the unit type (tuple variants are not allowed).
/// The location field will be automatically populated when using the error selector.
///
/// This macro will also update the display string (if defined) to also show the
/// location that has been captured.
///
/// **NOTE:** Adding the `location` field to an error enum will increase its size by
///           32 bytes, and an additional 32 bytes for each variant that contains a
///           `source` field (as this latter also has the extra size), recursively.
///           This might become expensive quite quickly, that's why the corresponding
///           feature isn't enabled by default.
pub use alaio_macros::with_location;

/// Implement the [`BinarySerializable`](trait@BinarySerializable) and
/// [`ABIReflect`](trait@ABIReflect) traits
///
/// This calls [`BinarySerializable::to_bin()`] and
/// [`BinarySerializable::from_bin()`] on all members sequentially, and
/// registers the equivalent ABI declaration for the type.
pub use alaio_macros::ABISerializable;

/// Implement the `serde::Serialize` and `serde::Deserialize` traits
///
/// Alaio contract namespaces expect enums (variant types) to be encoded as a
/// tuple of `(discriminant, value)` which is not natively supported by `serde`,
/// so this macro fills in the gap and should be used instead of
/// `#[derive(Serialize, Deserialize)]` for enum types. By default the
/// discriminant is serialized as a `snake_case` string.
///
/// It exposes one attribute argument for variants which is `serde(rename)`.
pub use alaio_macros::SerializeEnum;
