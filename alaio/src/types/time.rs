use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, ParseError as ChronoParseError, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use snafu::{OptionExt, ResultExt, Snafu};

use alaio_macros::with_location;

use crate::config;


const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const DATE_FORMAT_FLEX: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT_NO_SECS: &str = "%Y-%m-%dT%H:%M";


#[with_location]
#[derive(Debug, Snafu)]
pub enum InvalidTimestamp {
    #[snafu(display("cannot parse date/time"))]
    ParseError { source: ChronoParseError },

    #[snafu(display(r#"date out of range for timestamp type: "{repr}""#))]
    OutOfRange { repr: String },
}

/// Return a date parsed from its text form; timezone is UTC by default
/// (we don't use naive datetimes).
fn parse_date(s: &str) -> Result<DateTime<Utc>, InvalidTimestamp> {
    Ok(NaiveDateTime::parse_from_str(s, DATE_FORMAT_FLEX)
       .or_else(|_| NaiveDateTime::parse_from_str(s, DATE_FORMAT_NO_SECS))
       .context(ParseSnafu)?
       .and_utc())
}

fn timestamp_to_block_slot(dt: &DateTime<Utc>) -> Result<u32, InvalidTimestamp> {
    let ms_since_epoch = (dt.timestamp_micros() / 1000)
        .checked_sub(config::BLOCK_TIMESTAMP_EPOCH_MS)
        .filter(|ms| *ms >= 0)
        .context(OutOfRangeSnafu { repr: dt.to_string() })?;
    (ms_since_epoch / config::BLOCK_INTERVAL_MS).try_into()
        .ok().context(OutOfRangeSnafu { repr: dt.to_string() })
}

macro_rules! impl_time_display {
    ($typ:ty) => {
        impl fmt::Display for $typ {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_datetime().format(DATE_FORMAT))
            }
        }
    }
}

macro_rules! impl_serialize {
    ($typ:ty) => {
        impl Serialize for $typ {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where S: Serializer
            {
                self.to_string().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $typ {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s: String = String::deserialize(deserializer)?;
                Self::from_str(&s).map_err(|e| de::Error::custom(e.to_string()))
            }
        }
    }
}

macro_rules! impl_from {
    ($typ:ty, $inner:ty) => {
        impl From<$inner> for $typ {
            fn from(n: $inner) -> $typ {
                Self(n)
            }
        }

        impl From<$typ> for $inner {
            fn from(t: $typ) -> $inner {
                t.0
            }
        }

        impl TryFrom<&str> for $typ {
            type Error = InvalidTimestamp;
            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::from_str(value)
            }
        }
    }
}


// -----------------------------------------------------------------------------
//     TimePoint
// -----------------------------------------------------------------------------

/// Point in time with microsecond precision, as an `i64` count of
/// microseconds since the Unix epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TimePoint(i64);

impl TimePoint {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32, milli: u32) -> Option<Self> {
        Some(TimePoint::from_datetime(
            NaiveDate::from_ymd_opt(year, month, day)?
                .and_hms_milli_opt(hour, min, sec, milli)?
                .and_utc()))
    }
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        TimePoint(dt.timestamp_micros())
    }
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_micros(self.0).unwrap()  // safe unwrap
    }
}

impl_time_display!(TimePoint);
impl_serialize!(TimePoint);
impl_from!(TimePoint, i64);

impl FromStr for TimePoint {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TimePoint::from_datetime(parse_date(s)?))
    }
}


// -----------------------------------------------------------------------------
//     TimePointSec
// -----------------------------------------------------------------------------

/// Point in time with second precision, as a `u32` count of seconds since
/// the Unix epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        TimePointSec::from_datetime(
            NaiveDate::from_ymd_opt(year, month, day)?
                .and_hms_opt(hour, min, sec)?
                .and_utc()).ok()
    }
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self, InvalidTimestamp> {
        Ok(TimePointSec(dt.timestamp().try_into()
                        .ok().context(OutOfRangeSnafu { repr: dt.to_string() })?))
    }
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0 as i64 * 1000).unwrap()  // safe unwrap
    }
}

impl_time_display!(TimePointSec);
impl_serialize!(TimePointSec);
impl_from!(TimePointSec, u32);

impl FromStr for TimePointSec {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimePointSec::from_datetime(parse_date(s)?)
    }
}


// -----------------------------------------------------------------------------
//     BlockTimestamp
// -----------------------------------------------------------------------------

/// Point in time as a `u32` count of half-second block slots since the
/// block timestamp epoch (2000-01-01T00:00:00.000 UTC).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct BlockTimestamp(u32);

impl BlockTimestamp {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32, milli: u32) -> Option<Self> {
        BlockTimestamp::from_datetime(
            NaiveDate::from_ymd_opt(year, month, day)?
                .and_hms_milli_opt(hour, min, sec, milli)?
                .and_utc()).ok()
    }
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self, InvalidTimestamp> {
        Ok(BlockTimestamp(timestamp_to_block_slot(&dt)?))
    }
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(
            (self.0 as i64 * config::BLOCK_INTERVAL_MS) + config::BLOCK_TIMESTAMP_EPOCH_MS
        ).unwrap()  // safe unwrap
    }
}

impl_time_display!(BlockTimestamp);
impl_serialize!(BlockTimestamp);
impl_from!(BlockTimestamp, u32);

impl FromStr for BlockTimestamp {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockTimestamp::from_datetime(parse_date(s)?)
    }
}


// =============================================================================
//
//     Unittests
//
// =============================================================================
