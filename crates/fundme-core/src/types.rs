//! Primitive chain types: addresses, transaction hashes, wei quantities.
//!
//! All three cross the JSON-RPC boundary as 0x-prefixed hex strings, so
//! each type carries its wire parsing/formatting and serde support here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

/// Parse error for hex-encoded wire values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Missing 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("Invalid hex digit in: {0}")]
    InvalidHex(String),
    #[error("Expected {expected} hex digits, got {got}")]
    BadLength { expected: usize, got: usize },
    #[error("Quantity out of range: {0}")]
    Overflow(String),
}

fn strip_prefix(s: &str) -> Result<&str, ParseError> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| ParseError::MissingPrefix(s.to_string()))
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let digits = strip_prefix(s)?;
    if !digits.is_ascii() {
        return Err(ParseError::InvalidHex(s.to_string()));
    }
    if digits.len() != N * 2 {
        return Err(ParseError::BadLength {
            expected: N * 2,
            got: digits.len(),
        });
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| ParseError::InvalidHex(s.to_string()))?;
    }
    Ok(out)
}

fn encode_fixed(bytes: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x")?;
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

/// A 20-byte account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Create an address from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes of the address.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encode_fixed(&self.0, f)
    }
}

/// A 32-byte transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Create a hash from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for TxHash {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encode_fixed(&self.0, f)
    }
}

/// A quantity in the endpoint's base unit (wei).
///
/// u128 comfortably covers any balance this dispatcher will see; RPC
/// quantities that exceed it are rejected as out of range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wei(pub u128);

impl Wei {
    pub const ZERO: Self = Self(0);

    /// Whether this quantity is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Encode as a JSON-RPC quantity: 0x-hex, no leading zeros.
    #[must_use]
    pub fn to_quantity(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// Decode a JSON-RPC quantity.
    ///
    /// # Errors
    /// Returns error on a malformed or out-of-range hex string.
    pub fn from_quantity(s: &str) -> Result<Self, ParseError> {
        let digits = strip_prefix(s)?;
        if digits.is_empty() {
            return Err(ParseError::InvalidHex(s.to_string()));
        }
        if digits.len() > 32 {
            return Err(ParseError::Overflow(s.to_string()));
        }
        u128::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseError::InvalidHex(s.to_string()))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
