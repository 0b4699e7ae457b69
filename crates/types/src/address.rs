//! The 20-byte Ethereum address value type.
//!
//! Checksum casing and validation live in `usdcwallet-core` since they
//! require Keccak-256; this type only holds the raw bytes and renders
//! them as lowercase hex. Equality is case-insensitive by construction:
//! the bytes are the canonical representation, casing is just display.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A 20-byte Ethereum address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Wraps a raw 20-byte address.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parses a `0x`-prefixed or bare 40-hex-digit string into raw bytes,
    /// without checking EIP-55 casing. Use `usdcwallet_core::address::ensure_valid_address`
    /// for a validating parse.
    pub fn parse_hex(s: &str) -> Result<Self, Error> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 40 || !stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidAddress { value: s.into() });
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(stripped, &mut bytes).map_err(|_| Error::InvalidAddress {
            value: s.into(),
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}
