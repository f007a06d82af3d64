use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ensure, OptionExt, ResultExt, Snafu};


#[derive(Debug, Snafu)]
pub enum InvalidSymbol {
    #[snafu(display("creating symbol from empty string"))]
    Empty,

    #[snafu(display(r#"symbol name longer than 7 characters: "{name}""#))]
    TooLong { name: String },

    #[snafu(display("missing comma in symbol"))]
    MissingComma,

    #[snafu(display(r#"invalid char '{c}' in symbol "{symbol}""#))]
    CharError { symbol: String, c: char },

    #[snafu(display("could not parse precision for symbol"))]
    ParsePrecisionError { source: ParseIntError },

    #[snafu(display("given precision {given} should be <= max precision {max}"))]
    PrecisionError { given: u8, max: u8 },

    #[snafu(display("invalid u64 representation: {value} cannot be turned into a valid symbol"))]
    InvalidU64Representation { value: u64 },
}


/// Token name made of up to 7 upper case chars, encoded as a `uint64` with
/// one character per byte, first character in the least significant byte,
/// and zero bytes filling the unused tail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolCode(u64);

impl SymbolCode {
    pub fn new(s: &str) -> Result<SymbolCode, InvalidSymbol> {
        ensure!(!s.is_empty(), EmptySnafu);
        ensure!(s.len() <= 7, TooLongSnafu { name: s });
        if let Some(c) = s.bytes().find(|c| !c.is_ascii_uppercase()) {
            CharSnafu { symbol: s, c: c as char }.fail()?;
        }

        // fold the characters in reverse so the first one lands in the
        // least significant byte
        let value = s.bytes().rev().fold(0_u64, |packed, c| (packed << 8) | c as u64);
        Ok(SymbolCode(value))
    }

    pub fn from_u64(n: u64) -> SymbolCode {
        SymbolCode(n)
    }

    pub fn as_u64(&self) -> u64 { self.0 }
}

/// `Symbol` represents a token and contains precision and name.
///
/// When encoded as a `u64`, the least significant byte holds the number of
/// decimals and the remaining bytes hold the [`SymbolCode`].
///
/// ## Example
/// ```
/// # use alaio::{Symbol, SymbolCode, InvalidSymbol};
/// let symbol: Symbol = "4,CUR".parse()?;
/// assert_eq!(symbol.decimals(), 4);
/// assert_eq!(symbol.precision(), 10000);
/// assert_eq!(symbol.code(), SymbolCode::new("CUR")?);
/// # Ok::<(), InvalidSymbol>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    value: u64,
}

impl Symbol {
    const MAX_PRECISION: u8 = 18;

    /// Parse a symbol from its `"<decimals>,<CODE>"` text form.
    pub fn new(s: &str) -> Result<Self, InvalidSymbol> {
        let (decimals, code) = s.trim().split_once(',').context(MissingCommaSnafu)?;
        let decimals: u8 = decimals.parse().context(ParsePrecisionSnafu)?;
        ensure!(decimals <= Self::MAX_PRECISION,
                PrecisionSnafu { given: decimals, max: Self::MAX_PRECISION });

        Ok(Self {
            value: (SymbolCode::new(code)?.as_u64() << 8) | decimals as u64,
        })
    }

    /// Build a `Symbol` from its `u64` representation, rejecting values that
    /// no parsed symbol could produce (precision out of range, non-uppercase
    /// characters, or junk bytes after the zero terminator).
    pub fn from_u64(n: u64) -> Result<Self, InvalidSymbol> {
        let decimals = (n & 0xFF) as u8;
        ensure!(decimals <= Self::MAX_PRECISION && is_canonical_code(n >> 8),
                InvalidU64RepresentationSnafu { value: n });
        Ok(Self { value: n })
    }

    pub fn as_u64(&self) -> u64 { self.value }

    /// The number of decimal digits of the fractional part.
    pub fn decimals(&self) -> u8 {
        (self.value & 0xFF) as u8
    }

    /// `10^decimals`, the scale between the integer amount and its text form.
    pub fn precision(&self) -> i64 {
        // decimals <= 18 by construction, so this cannot overflow an i64
        10_i64.pow(self.decimals() as u32)
    }

    #[inline]
    pub fn code(&self) -> SymbolCode {
        SymbolCode(self.value >> 8)
    }

    pub fn name(&self) -> String {
        code_to_string(self.value >> 8)
    }
}


// -----------------------------------------------------------------------------
//     Helper functions
// -----------------------------------------------------------------------------

/// The characters of a symbol code, read byte by byte up to the first zero.
fn code_to_string(code: u64) -> String {
    code.to_le_bytes().iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as char)
        .collect()
}

/// Whether `code` could have been produced by [`SymbolCode::new`]: upper
/// case characters up to the first zero byte, and nothing but zeros after.
fn is_canonical_code(code: u64) -> bool {
    let bytes = code.to_le_bytes();
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    bytes[..len].iter().all(u8::is_ascii_uppercase)
        && bytes[len..].iter().all(|&c| c == 0)
}


// -----------------------------------------------------------------------------
//     Conversion traits
// -----------------------------------------------------------------------------

impl TryFrom<&str> for Symbol {
    type Error = InvalidSymbol;

    fn try_from(s: &str) -> Result<Symbol, InvalidSymbol> {
        Symbol::new(s)
    }
}


// -----------------------------------------------------------------------------
//     `Display` implementation
// -----------------------------------------------------------------------------

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&code_to_string(self.0))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.decimals(), self.name())
    }
}


// -----------------------------------------------------------------------------
//     `FromStr` implementation
// -----------------------------------------------------------------------------

impl FromStr for SymbolCode {
    type Err = InvalidSymbol;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymbolCode::new(s)
    }
}

impl FromStr for Symbol {
    type Err = InvalidSymbol;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}


// -----------------------------------------------------------------------------
//     `Serde` traits implementation
// -----------------------------------------------------------------------------

impl Serialize for SymbolCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SymbolCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code: String = String::deserialize(deserializer)?;
        SymbolCode::new(&code).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Symbol, D::Error>
    where
        D: Deserializer<'de>,
    {
        let symbol: String = String::deserialize(deserializer)?;
        Symbol::new(&symbol).map_err(|e| de::Error::custom(e.to_string()))
    }
}


// =============================================================================
//
//     Unittests
//
// =============================================================================
