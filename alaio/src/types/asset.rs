use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ensure, OptionExt, ResultExt, Snafu};

use alaio_macros::with_location;

use crate::{InvalidSymbol, Name, Symbol};


#[with_location]
#[derive(Debug, Snafu)]
pub enum InvalidAsset {
    #[snafu(display("asset amount and symbol should be separated with space"))]
    MissingSpace,

    #[snafu(display("missing decimal fraction after decimal point"))]
    MissingDecimal,

    #[snafu(display("could not parse amount for asset"))]
    ParseAmount { source: ParseIntError },

    #[snafu(display("amount overflow for: {amount}"))]
    AmountOverflow { amount: String },

    #[snafu(display("amount out of range, max is 2^62-1"))]
    AmountOutOfRange,

    #[snafu(display("could not parse symbol from asset string"))]
    InvalidSymbol { source: InvalidSymbol },
}


/// A quantity of some token, with the fractional digits given by the symbol
/// precision: `"1.2345 SYS"` is the amount 12345 with symbol `4,SYS`.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub struct Asset {
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    const MAX_AMOUNT: i64 = (1 << 62) - 1;

    pub fn new(amount: i64, symbol: Symbol) -> Result<Asset, InvalidAsset> {
        let result = Asset { amount, symbol };
        result.check_valid()?;
        Ok(result)
    }

    fn is_amount_within_range(&self) -> bool {
        -Self::MAX_AMOUNT <= self.amount && self.amount <= Self::MAX_AMOUNT
    }

    fn check_valid(&self) -> Result<(), InvalidAsset> {
        ensure!(self.is_amount_within_range(), AmountOutOfRangeSnafu);
        // no need to check for symbol.is_valid, it has been successfully constructed
        Ok(())
    }

    pub fn amount(&self) -> i64 { self.amount }
    pub fn symbol(&self) -> Symbol { self.symbol }
    pub fn symbol_name(&self) -> String { self.symbol.name() }
    pub fn decimals(&self) -> u8 { self.symbol.decimals() }
    pub fn precision(&self) -> i64 { self.symbol.precision() }

    pub fn from_str(s: &str) -> Result<Self, InvalidAsset> {
        let s = s.trim();

        // find space in order to split amount and symbol
        let space_pos = s.find(' ').context(MissingSpaceSnafu)?;

        let amount_str = &s[..space_pos];
        let symbol_str = &s[space_pos + 1..].trim();

        // the number of fractional digits determines the precision
        let dot_pos = amount_str.find('.');
        let precision;
        if let Some(dot_pos) = dot_pos {
            // if a decimal point is used, the decimal fraction must be there
            ensure!(dot_pos != amount_str.len() - 1, MissingDecimalSnafu);
            precision = amount_str.len() - dot_pos - 1;
        }
        else {
            precision = 0;
        }

        let symbol = Symbol::from_str(&format!("{},{}", precision, symbol_str))
            .context(InvalidSymbolSnafu)?;

        // parse amount
        let amount: i64 = match dot_pos {
            None => amount_str.parse().context(ParseAmountSnafu)?,
            Some(dot_pos) => {
                let int_part: i64 = amount_str[..dot_pos].parse().context(ParseAmountSnafu)?;
                let mut frac_part: i64 = amount_str[dot_pos + 1..].parse().context(ParseAmountSnafu)?;
                if amount_str.starts_with('-') { frac_part *= -1; }
                // check we don't overflow
                int_part
                    .checked_mul(symbol.precision())
                    .context(AmountOverflowSnafu { amount: amount_str.to_owned() })?
                    .checked_add(frac_part)
                    .context(AmountOverflowSnafu { amount: amount_str.to_owned() })?
            },
        };

        Asset::new(amount, symbol)
    }
}


impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs_amount: i64 = self.amount.abs();
        let mut result = (abs_amount / self.precision()).to_string();
        if self.decimals() != 0 {
            let frac: i64 = abs_amount % self.precision();
            result.push('.');
            result.push_str(&(self.precision() + frac).to_string()[1..]); // ensure we have the right number of leading zeros
        }

        write!(f, "{}{} {}", sign, result, self.symbol_name())
    }
}

impl FromStr for Asset {
    type Err = InvalidAsset;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::from_str(s)
    }
}

impl Serialize for Asset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D>(deserializer: D) -> Result<Asset, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr: String = String::deserialize(deserializer)?;
        Asset::from_str(&repr).map_err(|e| de::Error::custom(e.to_string()))
    }
}


/// An `Asset` together with the account of the contract managing the token.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct ExtendedAsset {
    pub quantity: Asset,
    pub contract: Name,
}


// =============================================================================
//
//     Unittests
//
// =============================================================================
