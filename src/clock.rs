//! Wall-clock time handling for CGM readings
//!
//! Readings carry a bare `HH:MM` time with no date attached. All arithmetic
//! treats two times as offsets from the same midnight, so a pair that
//! straddles midnight (23:50 then 00:10) measures 1420 minutes apart, not 20.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::FormatError;

/// A time of day with minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Build a clock time from hour and minute components
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ClockTime)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Minutes elapsed since midnight
    pub fn minutes_from_midnight(&self) -> u32 {
        self.0.num_seconds_from_midnight() / 60
    }
}

/// Parse a strict 24-hour `HH:MM` string
///
/// Exactly two digits, a colon, and two more digits are accepted. Single-digit
/// hours, seconds, AM/PM suffixes and surrounding whitespace are all rejected.
pub fn parse_clock_time(input: &str) -> Result<ClockTime, FormatError> {
    let malformed = || FormatError::MalformedTime {
        input: input.to_string(),
    };

    let bytes = input.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(malformed());
    }

    let digit = |b: u8| -> Result<u32, FormatError> {
        if b.is_ascii_digit() {
            Ok(u32::from(b - b'0'))
        } else {
            Err(malformed())
        }
    };

    let hour = digit(bytes[0])? * 10 + digit(bytes[1])?;
    let minute = digit(bytes[3])? * 10 + digit(bytes[4])?;

    ClockTime::new(hour, minute).ok_or_else(|| FormatError::TimeOutOfRange {
        input: input.to_string(),
        hour,
        minute,
    })
}

/// Absolute number of minutes between two same-day clock times
pub fn minutes_between(a: ClockTime, b: ClockTime) -> u32 {
    (b.0 - a.0).num_minutes().unsigned_abs() as u32
}

impl FromStr for ClockTime {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock_time(s)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_clock_time(&raw).map_err(serde::de::Error::custom)
    }
}
