//! Erase pattern validation

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// A validated erase byte
///
/// Parsing is the only way to build one from user input, so range checks
/// happen before any buffer is allocated or any request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErasePattern(u8);

impl ErasePattern {
    /// Pattern used when none is given (`0xFF`, the erased state of the parts)
    pub const DEFAULT: ErasePattern = ErasePattern(0xFF);

    /// Parse a hex byte such as `"CC"`, `"0x00"` or `"ff"`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (negative, trimmed) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let invalid = |reason| Error::InvalidPattern {
            input: input.to_string(),
            reason,
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("should be a HEX value"));
        }

        // Longer than any i64 is certainly out of range
        let value = i64::from_str_radix(digits, 16).unwrap_or(i64::MAX);
        let value = if negative { -value } else { value };
        Self::try_from(value).map_err(|_| invalid("should be within [0, 255] range"))
    }

    /// The byte value
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for ErasePattern {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for ErasePattern {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for ErasePattern {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value).map(Self).map_err(|_| Error::InvalidPattern {
            input: value.to_string(),
            reason: "should be within [0, 255] range",
        })
    }
}

impl FromStr for ErasePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ErasePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
