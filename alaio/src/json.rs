//! JSON output with the formatting conventions of the Alaio wire format.

use std::io;

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, Serializer};
use serde_json::Result;

/// JSON formatter with the following differences to `serde_json`'s default:
///  - `u128` and `i128` are represented as strings (ie: double-quoted), so
///    they survive the number-precision limits of JSON readers
///  - `f32` and `f64` never use scientific notation
pub struct AlaioFormatter {
    base: CompactFormatter,
}

impl AlaioFormatter {
    fn new() -> Self {
        AlaioFormatter { base: CompactFormatter {} }
    }
}

impl Formatter for AlaioFormatter {
    #[inline]
    fn write_u128<W>(&mut self, writer: &mut W, value: u128) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b"\"")?;
        self.base.write_u128(writer, value)?;
        writer.write_all(b"\"")
    }

    #[inline]
    fn write_i128<W>(&mut self, writer: &mut W, value: i128) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b"\"")?;
        self.base.write_i128(writer, value)?;
        writer.write_all(b"\"")
    }

    #[inline]
    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // use this instead of the default impl that uses Ryu in order to ensure
        // that we never use scientific notation
        write!(writer, "{}", value)
    }

    #[inline]
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // use this instead of the default impl that uses Ryu in order to ensure
        // that we never use scientific notation
        write!(writer, "{}", value)
    }
}


pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let fmt = AlaioFormatter::new();
    let mut vec = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut vec, fmt);
    value.serialize(&mut ser)?;
    let string = unsafe {
        // We do not emit invalid UTF-8.
        String::from_utf8_unchecked(vec)
    };
    Ok(string)
}

pub use serde_json::from_str;


// -----------------------------------------------------------------------------
//     Field-level helpers for the 64-bit integer convention
//
//     64-bit integers are transported as quoted strings so they survive the
//     number-precision limits of JSON readers. This cannot live in the
//     formatter: a `serde_json::Value` number is backed by an i64/u64, so
//     overriding `write_u64`/`write_i64` would also quote every small
//     integer routed through a `Value`. Native struct fields opt in with
//     `#[serde(with = "alaio::json::string_or_u64")]` instead.
// -----------------------------------------------------------------------------

macro_rules! impl_string_or_int {
    ($module:ident, $t:ty) => {
        #[doc = concat!("(De)serialize a `", stringify!($t),
                        "` as its quoted string form, accepting a bare JSON number on input.")]
        pub mod $module {
            use serde::{de, Deserialize, Deserializer, Serializer};

            pub fn serialize<S: Serializer>(value: &$t, ser: S) -> Result<S::Ok, S::Error> {
                ser.serialize_str(&value.to_string())
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<$t, D::Error> {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum NumOrStr {
                    Num($t),
                    Str(String),
                }

                match NumOrStr::deserialize(de)? {
                    NumOrStr::Num(n) => Ok(n),
                    NumOrStr::Str(s) => s.parse().map_err(de::Error::custom),
                }
            }
        }
    }
}

impl_string_or_int!(string_or_u64, u64);
impl_string_or_int!(string_or_i64, i64);

/// Same as [`string_or_u64`] for an optional field, keeping `null` for the
/// absent case.
pub mod opt_string_or_u64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(n) => ser.serialize_str(&n.to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NumOrStr {
            Num(u64),
            Str(String),
        }

        Ok(match Option::<NumOrStr>::deserialize(de)? {
            Some(NumOrStr::Num(n)) => Some(n),
            Some(NumOrStr::Str(s)) => Some(s.parse().map_err(de::Error::custom)?),
            None => None,
        })
    }
}
