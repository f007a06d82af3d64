use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ensure, Snafu};

use alaio_macros::with_location;


#[with_location]
#[derive(Debug, Snafu)]
pub enum InvalidName {
    #[snafu(display(r#"name is longer than 13 characters: "{name}""#))]
    TooLong { name: String },

    #[snafu(display(r#"invalid character '{c}' in name "{name}""#))]
    BadChar { name: String, c: char },

    #[snafu(display(r#"character '{c}' cannot be the 13th character of a name (only `.1-5a-j` fit there)"#))]
    BadTailChar { c: char },

    #[snafu(display(r#"name may not end with a dot: "{name}""#))]
    TrailingDot { name: String },
}

/// Represent an immutable account/action/table name, encoded as a `uint64`.
///
/// A name packs up to 13 characters of the base-32 alphabet
/// `.12345abcdefghijklmnopqrstuvwxyz` (`.` being 0). The first 12 characters
/// take 5 bits each, filled from the most significant bit down; a 13th
/// character goes into the 4 remaining low bits and so can only be one of
/// the first 16 alphabet entries. Unused tail slots stay 0, which is why the
/// textual form may not end with a dot: it would not survive the trimming of
/// that padding.
#[derive(Eq, Hash, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Default)]
pub struct Name {
    value: u64,
}

impl Name {
    /// Build a `Name` from its string representation.
    ///
    /// ## Example
    /// ```
    /// # use alaio::{Name, InvalidName};
    /// assert!(Name::new("nico").is_ok());
    /// assert_eq!(Name::new("alaio.token")?.to_string(), "alaio.token");
    /// assert_eq!(Name::new("a.b.c.d.e")?.to_string(), "a.b.c.d.e");
    /// assert_eq!(Name::new("")?.as_u64(), 0);
    /// # Ok::<(), InvalidName>(())
    /// ```
    pub fn new(s: &str) -> Result<Self, InvalidName> {
        ensure!(s.len() <= 13, TooLongSnafu { name: s });
        ensure!(!s.ends_with('.'), TrailingDotSnafu { name: s });

        let mut value: u64 = 0;
        for (i, c) in s.bytes().enumerate() {
            let sym = match char_value(c) {
                Some(sym) => sym,
                None => BadCharSnafu { name: s, c: c as char }.fail()?,
            };
            if i < 12 {
                value |= sym << (59 - 5 * i);
            }
            else {
                ensure!(sym < 16, BadTailCharSnafu { c: c as char });
                value |= sym;
            }
        }

        Ok(Name { value })
    }

    /// `const` variant of [`Name::new`], panicking on invalid input; meant
    /// for name literals known at compile time.
    pub const fn constant(s: &str) -> Self {
        let bytes = s.as_bytes();
        if bytes.len() > 13 { panic!("name is longer than 13 characters"); }
        if !bytes.is_empty() && bytes[bytes.len() - 1] == b'.' { panic!("name may not end with a dot"); }

        let mut value: u64 = 0;
        let mut i = 0;
        while i < bytes.len() {
            let sym = match char_value(bytes[i]) {
                Some(sym) => sym,
                None => panic!("invalid character in name"),
            };
            if i < 12 {
                value |= sym << (59 - 5 * i);
            }
            else {
                if sym >= 16 { panic!("13th character of a name must be one of `.1-5a-j`"); }
                value |= sym;
            }
            i += 1;
        }

        Name { value }
    }

    /// Build a `Name` from its `u64` representation.
    #[inline]
    pub const fn from_u64(n: u64) -> Self {
        // NOTE: no validation here, all u64 are valid names
        Self { value: n }
    }

    /// Return the name `u64` representation.
    #[inline]
    pub fn as_u64(&self) -> u64 { self.value }
}


// -----------------------------------------------------------------------------
//     Helper functions
// -----------------------------------------------------------------------------

const ALPHABET: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Position of `c` in the name alphabet, `None` when it has none.
const fn char_value(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'0') as u64),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

/// Walk the 13 character slots from the most significant down and trim the
/// `.` padding left in the unused tail slots.
fn format_name(value: u64) -> String {
    let mut out = String::with_capacity(13);
    for slot in 0..13 {
        let sym = match slot {
            12 => value & 0x0F,
            _ => (value >> (59 - 5 * slot)) & 0x1F,
        };
        out.push(ALPHABET[sym as usize] as char);
    }

    out.truncate(out.trim_end_matches('.').len());
    out
}


// -----------------------------------------------------------------------------
//     Conversion traits
// -----------------------------------------------------------------------------

impl TryFrom<&str> for Name {
    type Error = InvalidName;

    fn try_from(s: &str) -> Result<Name, InvalidName> {
        Name::new(s)
    }
}

impl From<u64> for Name {
    fn from(n: u64) -> Name {
        Name::from_u64(n)
    }
}


// -----------------------------------------------------------------------------
//     `Display` implementation
// -----------------------------------------------------------------------------

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_name(self.value))
    }
}


// -----------------------------------------------------------------------------
//     `FromStr` implementation
// -----------------------------------------------------------------------------

impl FromStr for Name {
    type Err = InvalidName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::new(s)
    }
}


// -----------------------------------------------------------------------------
//     `Serde` traits implementation
// -----------------------------------------------------------------------------

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Name, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name: String = String::deserialize(deserializer)?;
        Name::new(&name).map_err(|e| de::Error::custom(e.to_string()))
    }
}


// =============================================================================
//
//     Unittests
//
// =============================================================================
