use std::ops::Deref;
use std::str::ParseBoolError;

use hex::FromHexError;
use snafu::{OptionExt, ResultExt, Snafu};
use strum::{AsRefStr, Display, EnumDiscriminants, EnumString, VariantNames};
use tracing::instrument;

use alaio_macros::with_location;

use crate::{
    impl_auto_error_conversion, json, ByteStream, BinarySerializable, JsonError, JsonValue,
    SerializeError, StreamWriter,
};

use crate::types::{self,
    Asset, Bytes, BlockTimestamp, Checksum160, Checksum256, Checksum512, ExtendedAsset,
    Float128, InvalidAsset, InvalidCryptoData, InvalidName, InvalidSymbol, InvalidTimestamp,
    Name, PrivateKey, PublicKey, Signature, Symbol, SymbolCode, TimePoint, TimePointSec,
    VarInt32, VarUint32,
};

use crate::convert::{
    str_to_float, str_to_int, variant_to_float, variant_to_int, variant_to_str, variant_to_uint,
    ConversionError,
};

/// A value of any of the types the codec knows natively.
///
/// [`AlaioType`] is the companion enum listing only the type names; it is
/// what the ABI resolver uses to recognize a builtin type name.
#[derive(Debug, AsRefStr, EnumDiscriminants, VariantNames, Clone, PartialEq)]
#[strum(serialize_all = "snake_case")]
#[strum_discriminants(name(AlaioType))]
#[strum_discriminants(derive(Display, EnumString))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
pub enum AlaioValue {
    Bool(bool),

    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),

    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uint128(u128),

    #[strum(serialize = "varint32")]
    #[strum_discriminants(strum(serialize = "varint32"))]
    VarInt32(VarInt32),
    #[strum(serialize = "varuint32")]
    #[strum_discriminants(strum(serialize = "varuint32"))]
    VarUint32(VarUint32),

    Float32(f32),
    Float64(f64),
    Float128(Float128),

    Bytes(Bytes),
    String(types::String),

    TimePoint(TimePoint),
    TimePointSec(TimePointSec),
    #[strum(serialize = "block_timestamp_type")]
    #[strum_discriminants(strum(serialize = "block_timestamp_type"))]
    BlockTimestamp(BlockTimestamp),

    Checksum160(Box<Checksum160>),
    Checksum256(Box<Checksum256>),
    Checksum512(Box<Checksum512>),

    PublicKey(Box<PublicKey>),
    PrivateKey(Box<PrivateKey>),
    Signature(Box<Signature>),

    Name(Name),
    SymbolCode(SymbolCode),
    Symbol(Symbol),
    Asset(Asset),
    ExtendedAsset(Box<ExtendedAsset>),
}


impl AlaioValue {
    #[instrument]
    pub fn from_str(typename: AlaioType, repr: &str) -> Result<Self, InvalidValue> {
        Ok(match typename {
            AlaioType::Bool => Self::Bool(repr.parse().context(BoolSnafu)?),
            AlaioType::Int8 => Self::Int8(str_to_int(repr)?),
            AlaioType::Int16 => Self::Int16(str_to_int(repr)?),
            AlaioType::Int32 => Self::Int32(str_to_int(repr)?),
            AlaioType::Int64 => Self::Int64(str_to_int(repr)?),
            AlaioType::Int128 => Self::Int128(str_to_int(repr)?),
            AlaioType::Uint8 => Self::Uint8(str_to_int(repr)?),
            AlaioType::Uint16 => Self::Uint16(str_to_int(repr)?),
            AlaioType::Uint32 => Self::Uint32(str_to_int(repr)?),
            AlaioType::Uint64 => Self::Uint64(str_to_int(repr)?),
            AlaioType::Uint128 => Self::Uint128(str_to_int(repr)?),
            AlaioType::VarInt32 => Self::VarInt32(str_to_int::<i32>(repr)?.into()),
            AlaioType::VarUint32 => Self::VarUint32(str_to_int::<u32>(repr)?.into()),
            AlaioType::Float32 => Self::Float32(str_to_float(repr)?),
            AlaioType::Float64 => Self::Float64(str_to_float(repr)?),
            AlaioType::Float128 => Self::Float128(Float128::from_hex(repr).context(FromHexSnafu)?),
            AlaioType::Bytes => Self::Bytes(Bytes::from_hex(repr).context(FromHexSnafu)?),
            AlaioType::String => Self::String(repr.to_owned()),
            AlaioType::TimePoint => Self::TimePoint(repr.parse()?),
            AlaioType::TimePointSec => Self::TimePointSec(repr.parse()?),
            AlaioType::BlockTimestamp => Self::BlockTimestamp(repr.parse()?),
            AlaioType::Checksum160 => Self::Checksum160(Box::new(Checksum160::from_hex(repr).context(FromHexSnafu)?)),
            AlaioType::Checksum256 => Self::Checksum256(Box::new(Checksum256::from_hex(repr).context(FromHexSnafu)?)),
            AlaioType::Checksum512 => Self::Checksum512(Box::new(Checksum512::from_hex(repr).context(FromHexSnafu)?)),
            AlaioType::PublicKey => Self::PublicKey(Box::new(PublicKey::new(repr).context(CryptoDataSnafu)?)),
            AlaioType::PrivateKey => Self::PrivateKey(Box::new(PrivateKey::new(repr).context(CryptoDataSnafu)?)),
            AlaioType::Signature => Self::Signature(Box::new(Signature::new(repr).context(CryptoDataSnafu)?)),
            AlaioType::Name => Self::Name(Name::new(repr).context(NameSnafu)?),
            AlaioType::SymbolCode => Self::SymbolCode(SymbolCode::new(repr).context(SymbolSnafu)?),
            AlaioType::Symbol => Self::Symbol(Symbol::new(repr).context(SymbolSnafu)?),
            AlaioType::Asset => Self::Asset(repr.parse().context(AssetSnafu { repr })?),
            AlaioType::ExtendedAsset => Self::from_variant(typename, &json::from_str(repr).context(JsonParseSnafu)?)?,
        })
    }

    pub fn to_variant(&self) -> JsonValue {
        match self {
            Self::Bool(b) => json!(b),
            Self::Int8(n) => json!(n),
            Self::Int16(n) => json!(n),
            Self::Int32(n) => json!(n),
            // 64-bit and wider integers are transported as quoted strings so
            // they survive the precision limits of JSON numbers
            Self::Int64(n) => json!(n.to_string()),
            Self::Int128(n) => json!(n.to_string()),
            Self::Uint8(n) => json!(n),
            Self::Uint16(n) => json!(n),
            Self::Uint32(n) => json!(n),
            Self::Uint64(n) => json!(n.to_string()),
            Self::Uint128(n) => json!(n.to_string()),
            Self::VarInt32(n) => json!(i32::from(*n)),
            Self::VarUint32(n) => json!(u32::from(*n)),
            Self::Float32(x) => float_to_variant(*x as f64),
            Self::Float64(x) => float_to_variant(*x),
            Self::Float128(x) => json!(x.to_hex()),
            Self::Bytes(b) => json!(b.to_hex()),
            Self::String(s) => json!(s),
            Self::TimePoint(t) => json!(t.to_string()),
            Self::TimePointSec(t) => json!(t.to_string()),
            Self::BlockTimestamp(t) => json!(t.to_string()),
            Self::Checksum160(c) => json!(c.to_hex()),
            Self::Checksum256(c) => json!(c.to_hex()),
            Self::Checksum512(c) => json!(c.to_hex()),
            Self::PublicKey(key) => json!(key.to_string()),
            Self::PrivateKey(key) => json!(key.to_string()),
            Self::Signature(sig) => json!(sig.to_string()),
            Self::Name(name) => json!(name.to_string()),
            Self::SymbolCode(sym) => json!(sym.to_string()),
            Self::Symbol(sym) => json!(sym.to_string()),
            Self::Asset(asset) => json!(asset.to_string()),
            Self::ExtendedAsset(ea) => {
                let ea = ea.deref();
                json!({
                    "quantity": ea.quantity,
                    "contract": ea.contract,
                })
            },
        }
    }

    #[instrument]
    pub fn from_variant(typename: AlaioType, v: &JsonValue) -> Result<Self, InvalidValue> {
        let incompatible_types = || {
            IncompatibleVariantTypesSnafu { typename, value: Box::new(v.clone()) }
        };

        Ok(match typename {
            AlaioType::Bool => Self::Bool(v.as_bool().with_context(incompatible_types)?),
            AlaioType::Int8 => Self::Int8(variant_to_int(v)?),
            AlaioType::Int16 => Self::Int16(variant_to_int(v)?),
            AlaioType::Int32 => Self::Int32(variant_to_int(v)?),
            AlaioType::Int64 => Self::Int64(variant_to_int(v)?),
            AlaioType::Int128 => Self::Int128(variant_to_int(v)?),
            AlaioType::Uint8 => Self::Uint8(variant_to_uint(v)?),
            AlaioType::Uint16 => Self::Uint16(variant_to_uint(v)?),
            AlaioType::Uint32 => Self::Uint32(variant_to_uint(v)?),
            AlaioType::Uint64 => Self::Uint64(variant_to_uint(v)?),
            AlaioType::Uint128 => Self::Uint128(variant_to_uint(v)?),
            AlaioType::VarInt32 => Self::VarInt32(variant_to_int::<i32>(v)?.into()),
            AlaioType::VarUint32 => Self::VarUint32(variant_to_uint::<u32>(v)?.into()),
            AlaioType::Float32 => Self::Float32(variant_to_float(v)?),
            AlaioType::Float64 => Self::Float64(variant_to_float(v)?),
            AlaioType::Float128 => Self::Float128(
                Float128::from_hex(variant_to_str(v)?).context(FromHexSnafu)?),
            AlaioType::Bytes => Self::Bytes(Bytes::from_hex(
                v.as_str().with_context(incompatible_types)?
            ).context(FromHexSnafu)?),
            AlaioType::String => Self::String(v.as_str().with_context(incompatible_types)?.to_owned()),
            AlaioType::TimePoint => {
                let repr = v.as_str().with_context(incompatible_types)?;
                Self::TimePoint(repr.parse()?)
            },
            AlaioType::TimePointSec => {
                let repr = v.as_str().with_context(incompatible_types)?;
                Self::TimePointSec(repr.parse()?)
            },
            AlaioType::BlockTimestamp => {
                let repr = v.as_str().with_context(incompatible_types)?;
                Self::BlockTimestamp(repr.parse()?)
            },
            AlaioType::Checksum160 => {
                Self::Checksum160(Box::new(Checksum160::from_hex(v.as_str().with_context(incompatible_types)?)
                                  .context(FromHexSnafu)?))
            },
            AlaioType::Checksum256 => {
                Self::Checksum256(Box::new(Checksum256::from_hex(v.as_str().with_context(incompatible_types)?)
                                  .context(FromHexSnafu)?))
            },
            AlaioType::Checksum512 => {
                Self::Checksum512(Box::new(Checksum512::from_hex(v.as_str().with_context(incompatible_types)?)
                                  .context(FromHexSnafu)?))
            },
            AlaioType::PublicKey
            | AlaioType::PrivateKey
            | AlaioType::Signature
            | AlaioType::Name
            | AlaioType::Symbol
            | AlaioType::SymbolCode
            | AlaioType::Asset => Self::from_str(typename, v.as_str().with_context(incompatible_types)?)?,
            AlaioType::ExtendedAsset => {
                let ea = v.as_object().with_context(incompatible_types)?;
                let qty = variant_to_str(ea.get("quantity").with_context(incompatible_types)?)?;
                Self::ExtendedAsset(Box::new(ExtendedAsset {
                    quantity: qty.parse().context(AssetSnafu { repr: qty })?,
                    contract: Name::new(
                        ea.get("contract").and_then(|c| c.as_str()).with_context(incompatible_types)?
                    ).context(NameSnafu)?,
                }))
            },
        })
    }

    pub fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        match self {
            Self::Bool(b) => b.to_bin(stream),
            Self::Int8(n) => n.to_bin(stream),
            Self::Int16(n) => n.to_bin(stream),
            Self::Int32(n) => n.to_bin(stream),
            Self::Int64(n) => n.to_bin(stream),
            Self::Int128(n) => n.to_bin(stream),
            Self::Uint8(n) => n.to_bin(stream),
            Self::Uint16(n) => n.to_bin(stream),
            Self::Uint32(n) => n.to_bin(stream),
            Self::Uint64(n) => n.to_bin(stream),
            Self::Uint128(n) => n.to_bin(stream),
            Self::VarInt32(n) => n.to_bin(stream),
            Self::VarUint32(n) => n.to_bin(stream),
            Self::Float32(x) => x.to_bin(stream),
            Self::Float64(x) => x.to_bin(stream),
            Self::Float128(x) => x.to_bin(stream),
            Self::Bytes(b) => b.to_bin(stream),
            Self::String(s) => s.to_bin(stream),
            Self::TimePoint(t) => t.to_bin(stream),
            Self::TimePointSec(t) => t.to_bin(stream),
            Self::BlockTimestamp(t) => t.to_bin(stream),
            Self::Checksum160(c) => c.to_bin(stream),
            Self::Checksum256(c) => c.to_bin(stream),
            Self::Checksum512(c) => c.to_bin(stream),
            Self::PublicKey(key) => key.to_bin(stream),
            Self::PrivateKey(key) => key.to_bin(stream),
            Self::Signature(sig) => sig.to_bin(stream),
            Self::Name(name) => name.to_bin(stream),
            Self::Symbol(sym) => sym.to_bin(stream),
            Self::SymbolCode(sym) => sym.to_bin(stream),
            Self::Asset(asset) => asset.to_bin(stream),
            Self::ExtendedAsset(ea) => ea.deref().to_bin(stream),
        }
    }

    #[instrument(skip(stream))]
    pub fn from_bin(typename: AlaioType, stream: &mut ByteStream) -> Result<Self, SerializeError> {
        Ok(match typename {
            AlaioType::Bool => Self::Bool(bool::from_bin(stream)?),
            AlaioType::Int8 => Self::Int8(i8::from_bin(stream)?),
            AlaioType::Int16 => Self::Int16(i16::from_bin(stream)?),
            AlaioType::Int32 => Self::Int32(i32::from_bin(stream)?),
            AlaioType::Int64 => Self::Int64(i64::from_bin(stream)?),
            AlaioType::Int128 => Self::Int128(i128::from_bin(stream)?),
            AlaioType::Uint8 => Self::Uint8(u8::from_bin(stream)?),
            AlaioType::Uint16 => Self::Uint16(u16::from_bin(stream)?),
            AlaioType::Uint32 => Self::Uint32(u32::from_bin(stream)?),
            AlaioType::Uint64 => Self::Uint64(u64::from_bin(stream)?),
            AlaioType::Uint128 => Self::Uint128(u128::from_bin(stream)?),
            AlaioType::VarInt32 => Self::VarInt32(VarInt32::from_bin(stream)?),
            AlaioType::VarUint32 => Self::VarUint32(VarUint32::from_bin(stream)?),
            AlaioType::Float32 => Self::Float32(f32::from_bin(stream)?),
            AlaioType::Float64 => Self::Float64(f64::from_bin(stream)?),
            AlaioType::Float128 => Self::Float128(Float128::from_bin(stream)?),
            AlaioType::Bytes => Self::Bytes(Bytes::from_bin(stream)?),
            AlaioType::String => Self::String(String::from_bin(stream)?),
            AlaioType::TimePoint => Self::TimePoint(TimePoint::from_bin(stream)?),
            AlaioType::TimePointSec => Self::TimePointSec(TimePointSec::from_bin(stream)?),
            AlaioType::BlockTimestamp => Self::BlockTimestamp(BlockTimestamp::from_bin(stream)?),
            AlaioType::Checksum160 => Self::Checksum160(Box::new(Checksum160::from_bin(stream)?)),
            AlaioType::Checksum256 => Self::Checksum256(Box::new(Checksum256::from_bin(stream)?)),
            AlaioType::Checksum512 => Self::Checksum512(Box::new(Checksum512::from_bin(stream)?)),
            AlaioType::PublicKey => Self::PublicKey(Box::new(PublicKey::from_bin(stream)?)),
            AlaioType::PrivateKey => Self::PrivateKey(Box::new(PrivateKey::from_bin(stream)?)),
            AlaioType::Signature => Self::Signature(Box::new(Signature::from_bin(stream)?)),
            AlaioType::Name => Self::Name(Name::from_bin(stream)?),
            AlaioType::Symbol => Self::Symbol(Symbol::from_bin(stream)?),
            AlaioType::SymbolCode => Self::SymbolCode(SymbolCode::from_bin(stream)?),
            AlaioType::Asset => Self::Asset(Asset::from_bin(stream)?),
            AlaioType::ExtendedAsset => Self::ExtendedAsset(Box::new(ExtendedAsset::from_bin(stream)?)),
        })
    }
}

/// Non-finite floats cannot be represented as JSON numbers, they use the
/// quoted forms `"NaN"`, `"Infinity"` and `"-Infinity"` instead.
fn float_to_variant(x: f64) -> JsonValue {
    if x.is_finite() {
        json!(x)
    }
    else if x.is_nan() {
        json!("NaN")
    }
    else if x > 0.0 {
        json!("Infinity")
    }
    else {
        json!("-Infinity")
    }
}

#[with_location]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InvalidValue {
    #[snafu(display(r#"cannot convert given variant {value} to Alaio type "{typename}""#))]
    IncompatibleVariantTypes {
        typename: AlaioType,
        value: Box<JsonValue>,
    },

    #[snafu(display("invalid bool"))]
    Bool { source: ParseBoolError },

    #[snafu(display("invalid conversion"))]
    Conversion { source: ConversionError },

    #[snafu(display("invalid name"))]
    Name { source: InvalidName },

    #[snafu(display("invalid symbol"))]
    Symbol { source: InvalidSymbol },

    #[snafu(display("invalid asset"))]
    Asset {
        repr: String,
        source: InvalidAsset,
    },

    #[snafu(display("invalid hex representation"))]
    FromHex { source: FromHexError },

    #[snafu(display("invalid crypto data"))]
    CryptoData { source: InvalidCryptoData },

    #[snafu(display("cannot parse JSON string"))]
    JsonParse { source: JsonError },

    #[snafu(display("cannot parse date/time"))]
    DateTimeParse { source: InvalidTimestamp },
}

impl_auto_error_conversion!(ConversionError, InvalidValue, ConversionSnafu);
impl_auto_error_conversion!(InvalidTimestamp, InvalidValue, DateTimeParseSnafu);
