//! Start offsets
//!
//! Looping ambient tracks may begin at one of several alternate positions so
//! restarts don't always sound identical. Offsets are written as `mm:ss`.

use crate::error::{MixerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed `mm:ss` start position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StartOffset {
    minutes: u32,
    seconds: u8,
}

impl StartOffset {
    /// Build an offset from minutes and seconds
    ///
    /// # Errors
    /// Returns `InvalidOffset` if `seconds` is 60 or more
    pub fn new(minutes: u32, seconds: u8) -> Result<Self> {
        if seconds >= 60 {
            return Err(MixerError::InvalidOffset(format!("{minutes:02}:{seconds:02}")));
        }
        Ok(Self { minutes, seconds })
    }

    /// Parse an `mm:ss` string.
    ///
    /// Both parts must be non-empty ASCII digits and seconds must be below 60.
    /// Minutes are not capped.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || MixerError::InvalidOffset(input.to_string());

        let (minutes, seconds) = input.trim().split_once(':').ok_or_else(invalid)?;
        if !is_digits(minutes) || !is_digits(seconds) {
            return Err(invalid());
        }

        let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
        let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
        if seconds >= 60 {
            return Err(invalid());
        }

        Ok(Self {
            minutes,
            seconds: seconds as u8,
        })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    /// Offset in milliseconds, the unit the engine seeks in
    pub fn as_millis(&self) -> u64 {
        (u64::from(self.minutes) * 60 + u64::from(self.seconds)) * 1000
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for StartOffset {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for StartOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}
