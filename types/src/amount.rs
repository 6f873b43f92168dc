//! Token amounts.
//!
//! Amounts are 18-decimal fixed-point integers stored as raw `u128` units.
//! `1 token = 10^18 raw`. All arithmetic is integer; division truncates.

use crate::error::TypesError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Raw units per whole token (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// An amount of the registry's payment token, in raw units.
///
/// Human-readable formats carry the decimal token notation (`"10.0"`,
/// `"0.5"`); binary formats carry the raw `u128`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole tokens to raw units.
    pub const fn from_tokens(tokens: u128) -> Self {
        Self(tokens * TOKEN_UNIT)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Whole tokens, truncating the fractional part.
    pub fn to_tokens(&self) -> u128 {
        self.0 / TOKEN_UNIT
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Integer division truncating toward zero. Returns `ZERO` for a zero divisor.
    pub fn div_floor(self, divisor: u128) -> Self {
        Self(self.0.checked_div(divisor).unwrap_or(0))
    }
}

impl Add for TokenAmount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TokenAmount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / TOKEN_UNIT;
        let frac = self.0 % TOKEN_UNIT;
        if frac == 0 {
            write!(f, "{whole}.0")
        } else {
            let digits = format!("{frac:018}");
            write!(f, "{whole}.{}", digits.trim_end_matches('0'))
        }
    }
}

/// Parses `"<whole>.<fraction>"` as tokens (up to 18 fractional digits) and a
/// bare integer as raw units.
impl FromStr for TokenAmount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidAmount(s.to_string());
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        match s.split_once('.') {
            None if digits(s) => s.parse::<u128>().map(Self).map_err(|_| invalid()),
            None => Err(invalid()),
            Some((whole, frac)) => {
                if !digits(whole) || !digits(frac) || frac.len() > 18 {
                    return Err(invalid());
                }
                let whole: u128 = whole.parse().map_err(|_| invalid())?;
                let frac: u128 = format!("{frac:0<18}").parse().map_err(|_| invalid())?;
                whole
                    .checked_mul(TOKEN_UNIT)
                    .and_then(|w| w.checked_add(frac))
                    .map(Self)
                    .ok_or_else(invalid)
            }
        }
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u128(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            text.parse().map_err(serde::de::Error::custom)
        } else {
            u128::deserialize(deserializer).map(Self)
        }
    }
}
