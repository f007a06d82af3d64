//!
//! This module provides tools to encode/decode values into/from the binary
//! wire format according to an ABI (a data schema for a contract namespace).
//!

mod context;
mod definition;
mod error;
mod reflect;
mod serializer;
mod typename;
pub mod data;

pub use context::AbiContext;
pub use definition::{
    abi_schema, ABIDefinition, Action, ActionResult, ClausePair, ErrorMessage, Extension, Field,
    Struct, Table, TypeDef, Variant,
};
pub use error::ABIError;
pub use reflect::ABIReflect;
pub use serializer::ABI;
pub use typename::TypeNameRef;
