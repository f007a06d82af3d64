use std::str::{from_utf8, Utf8Error};

use snafu::{ResultExt, Snafu};

use alaio_macros::with_location;

use crate::{
    impl_auto_error_conversion,
    types::*,
    ByteStream, SizeStream, StreamError, StreamWriter,
};


#[with_location]
#[derive(Debug, Snafu)]
pub enum SerializeError {
    #[snafu(display("stream error"))]
    StreamError { source: StreamError },

    #[snafu(display("invalid symbol"))]
    InvalidSymbol { source: InvalidSymbol },

    #[snafu(display("invalid asset"))]
    InvalidAsset { source: InvalidAsset },

    #[snafu(display("cannot decode bytes as utf-8"))]
    Utf8Error { source: Utf8Error },

    #[snafu(display("invalid crypto data"))]
    InvalidCryptoData { source: InvalidCryptoData },

    #[snafu(display("cannot parse bool from stream"))]
    InvalidBool,

    #[snafu(display("invalid tag (discriminant): {tag} for variant type `{variant}`"), visibility(pub))]
    InvalidTag { tag: u32, variant: String },
}

impl_auto_error_conversion!(StreamError, SerializeError, StreamSnafu);
impl_auto_error_conversion!(InvalidSymbol, SerializeError, InvalidSymbolSnafu);
impl_auto_error_conversion!(InvalidAsset, SerializeError, InvalidAssetSnafu);
impl_auto_error_conversion!(InvalidCryptoData, SerializeError, InvalidCryptoDataSnafu);


/// Define methods required to (de)serialize a type to/from a binary stream.
///
/// Writing is generic over the [`StreamWriter`] flavors so that the same
/// implementation can produce bytes, count them, or fill a fixed buffer.
pub trait BinarySerializable {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError>;
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError>
    where
        Self: Sized;
}

/// Serialize a `BinarySerializable` type to binary data.
pub fn to_bin<T: BinarySerializable>(value: &T) -> Result<Bytes, SerializeError> {
    let mut s = ByteStream::new();
    value.to_bin(&mut s)?;
    Ok(Bytes(s.into_bytes()))
}

/// Return the hex representation of the binary serialization of a
/// `BinarySerializable` type.
pub fn to_hex<T: BinarySerializable>(value: &T) -> Result<String, SerializeError> {
    let mut s = ByteStream::new();
    value.to_bin(&mut s)?;
    Ok(s.hex_data())
}

/// Return the number of bytes the binary serialization of a value takes,
/// without producing them.
pub fn packed_size<T: BinarySerializable>(value: &T) -> Result<usize, SerializeError> {
    let mut s = SizeStream::new();
    value.to_bin(&mut s)?;
    Ok(s.size())
}

pub fn from_bin<T: BinarySerializable>(bin: impl AsRef<[u8]>) -> Result<T, SerializeError> {
    let mut s = ByteStream::from(bin.as_ref().to_vec());
    T::from_bin(&mut s)
}

// -----------------------------------------------------------------------------
//     Boilerplate macros
// -----------------------------------------------------------------------------

macro_rules! impl_pod_serialization {
    ($typ:ty, $size:literal) => {
        impl BinarySerializable for $typ {
            #[inline]
            fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
                Ok(stream.write_bytes(&self.to_le_bytes())?)
            }
            #[inline]
            fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
                Ok(<$typ>::from_le_bytes(stream.read_bytes($size)?.try_into().unwrap()))  // safe unwrap
            }
        }
    }
}

macro_rules! impl_wrapped_serialization {
    ($typ:ty, $inner:ty) => {
        impl BinarySerializable for $typ {
            #[inline]
            fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
                <$inner>::from(*self).to_bin(stream)
            }
            #[inline]
            fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
                Ok(<$typ>::from(<$inner>::from_bin(stream)?))
            }
        }
    }
}

macro_rules! impl_array_serialization {
    ($typ:ty, $size:literal) => {
        impl BinarySerializable for $typ {
            #[inline]
            fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
                Ok(stream.write_bytes(&self.0[..])?)
            }
            #[inline]
            fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
                let arr: [u8; $size] = stream.read_bytes($size)?.try_into().unwrap();  // safe unwrap
                Ok(<$typ>::from(arr))
            }
        }
    }
}


// -----------------------------------------------------------------------------
//     Serialization of ints and native Rust types
// -----------------------------------------------------------------------------

impl BinarySerializable for bool {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        Ok(stream.write_byte(match *self {
            true => 1u8,
            false => 0u8,
        })?)
    }
    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        match stream.read_byte()? {
            1 => Ok(true),
            0 => Ok(false),
            _ => InvalidBoolSnafu.fail(),
        }
    }
}

impl BinarySerializable for i8 {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        Ok(stream.write_byte(*self as u8)?)
    }
    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        Ok(stream.read_byte()? as i8)
    }
}

impl_pod_serialization!(i16, 2);
impl_pod_serialization!(i32, 4);
impl_pod_serialization!(i64, 8);
impl_pod_serialization!(i128, 16);

impl BinarySerializable for u8 {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        Ok(stream.write_byte(*self)?)
    }
    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        Ok(stream.read_byte()?)
    }
}

impl_pod_serialization!(u16, 2);
impl_pod_serialization!(u32, 4);
impl_pod_serialization!(u64, 8);
impl_pod_serialization!(u128, 16);

impl_pod_serialization!(f32, 4);
impl_pod_serialization!(f64, 8);

impl BinarySerializable for Float128 {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        Ok(stream.write_bytes(self.to_bin_repr())?)
    }
    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let arr: [u8; 16] = stream.read_bytes(16)?.try_into().unwrap();  // safe unwrap
        Ok(Float128::from_bin_repr(&arr))
    }
}


impl BinarySerializable for VarInt32 {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        Ok(stream.write_var_i32(i32::from(*self))?)
    }
    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        Ok(stream.read_var_i32()?.into())
    }
}

impl BinarySerializable for VarUint32 {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        Ok(stream.write_var_u32(u32::from(*self))?)
    }
    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        Ok(stream.read_var_u32()?.into())
    }
}


// -----------------------------------------------------------------------------
//     Serialization of string types
// -----------------------------------------------------------------------------

impl BinarySerializable for Bytes {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        stream.write_var_u32(self.0.len() as u32)?;
        Ok(stream.write_bytes(&self.0[..])?)
    }
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let len = stream.read_var_u32()? as usize;
        Ok(Bytes::from(stream.read_bytes(len)?))
    }
}

impl BinarySerializable for String {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        stream.write_var_u32(self.len() as u32)?;
        Ok(stream.write_bytes(self.as_bytes())?)
    }
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let len = stream.read_var_u32()? as usize;
        from_utf8(stream.read_bytes(len)?).context(Utf8Snafu).map(|s| s.to_owned())
    }
}

// -----------------------------------------------------------------------------
//     Serialization of time types
// -----------------------------------------------------------------------------

impl_wrapped_serialization!(TimePoint, i64);
impl_wrapped_serialization!(TimePointSec, u32);
impl_wrapped_serialization!(BlockTimestamp, u32);


// -----------------------------------------------------------------------------
//     Serialization of checksum types
// -----------------------------------------------------------------------------

impl_array_serialization!(Checksum160, 20);
impl_array_serialization!(Checksum256, 32);
impl_array_serialization!(Checksum512, 64);


// -----------------------------------------------------------------------------
//     Serialization of Alaio domain types
// -----------------------------------------------------------------------------

impl BinarySerializable for Name {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        self.as_u64().to_bin(stream)
    }

    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let n = u64::from_bin(stream)?;
        Ok(Name::from_u64(n))
    }
}

impl BinarySerializable for Symbol {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        self.as_u64().to_bin(stream)
    }

    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let n = u64::from_bin(stream)?;
        Ok(Symbol::from_u64(n)?)
    }
}

impl BinarySerializable for SymbolCode {
    #[inline]
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        self.as_u64().to_bin(stream)
    }

    #[inline]
    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let n = u64::from_bin(stream)?;
        Ok(SymbolCode::from_u64(n))
    }
}

impl BinarySerializable for Asset {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        self.amount().to_bin(stream)?;
        self.symbol().to_bin(stream)
    }

    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let amount = i64::from_bin(stream)?;
        let symbol = Symbol::from_bin(stream)?;
        Ok(Asset::new(amount, symbol)?)
    }
}

impl BinarySerializable for ExtendedAsset {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        self.quantity.to_bin(stream)?;
        self.contract.to_bin(stream)
    }

    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let quantity = Asset::from_bin(stream)?;
        let contract = Name::from_bin(stream)?;
        Ok(ExtendedAsset { quantity, contract })
    }
}

impl<T: CryptoDataType, const DATA_SIZE: usize> BinarySerializable for CryptoData<T, DATA_SIZE> {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        stream.write_byte(self.key_type().index())?;
        Ok(stream.write_bytes(self.data())?)
    }

    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let key_type = KeyType::from_index(stream.read_byte()?)?;
        // WebAuthn payloads are variable-length, a fixed-size read would
        // silently misparse them
        if key_type == KeyType::WebAuthn {
            return Err(InvalidCryptoData::unsupported("WA").into());
        }
        let data = stream.read_bytes(DATA_SIZE)?.try_into().unwrap();  // safe unwrap
        Ok(Self::with_key_type(key_type, data))
    }
}

// this, coupled with the blanket impl for Vec, gives us the impl for the
// `Extensions` type
impl BinarySerializable for (u16, Bytes) {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        self.0.to_bin(stream)?;
        self.1.to_bin(stream)
    }

    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let id = u16::from_bin(stream)?;
        let data = Bytes::from_bin(stream)?;
        Ok((id, data))
    }
}


// =============================================================================
//
//     Other useful blanket implementations for containers
//
// =============================================================================

impl<T: BinarySerializable> BinarySerializable for Vec<T> {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        stream.write_var_u32(self.len() as u32)?;
        for elem in self {
            elem.to_bin(stream)?;
        }
        Ok(())
    }

    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        let len: u32 = stream.read_var_u32()?;
        // limit the capacity that can be reserved before data is actually read
        let mut result = Vec::with_capacity(len.min(1024) as usize);
        for _ in 0..len {
            result.push(T::from_bin(stream)?);
        }
        Ok(result)
    }
}

impl<T: BinarySerializable> BinarySerializable for Option<T> {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        match self {
            Some(v) => {
                true.to_bin(stream)?;
                v.to_bin(stream)
            },
            None => {
                false.to_bin(stream)
            }
        }
    }

    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        Ok(match bool::from_bin(stream)? {
            true => Some(T::from_bin(stream)?),
            false => None,
        })
    }
}

impl<T: BinarySerializable> BinarySerializable for Box<T> {
    fn to_bin<W: StreamWriter>(&self, stream: &mut W) -> Result<(), SerializeError> {
        self.as_ref().to_bin(stream)
    }

    fn from_bin(stream: &mut ByteStream) -> Result<Self, SerializeError> {
        Ok(Box::new(T::from_bin(stream)?))
    }
}
