use std::str::FromStr;

use hex::FromHexError;

/// Opaque 16-byte IEEE-754 quadruple precision float.
///
/// There is no native Rust support for 128-bit floats on stable, so this type
/// only carries the raw little-endian representation around; its text form is
/// the lowercase hex of those 16 bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Float128([u8; 16]);

impl Float128 {
    pub fn from_hex(repr: &str) -> Result<Self, FromHexError> {
        let mut result = Float128::default();
        hex::decode_to_slice(repr, &mut result.0)?;
        Ok(result)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_bin_repr(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn from_bin_repr(bin: &[u8; 16]) -> Self {
        Float128(*bin)
    }
}

impl From<[u8; 16]> for Float128 {
    fn from(bin: [u8; 16]) -> Self {
        Float128(bin)
    }
}

impl FromStr for Float128 {
    type Err = FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Float128::from_hex(s)
    }
}
