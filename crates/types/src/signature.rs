//! ECDSA signature components as used on the wire (`v`, `r`, `s`).

use serde::{Deserialize, Serialize};

/// A secp256k1 ECDSA signature in Ethereum's `(v, r, s)` shape.
///
/// `v` is stored as the full legacy/EIP-155 value (not just the 0/1
/// recovery parity); callers that need the bare recovery id should
/// recompute it from the chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Recovery parameter, already combined with EIP-155 chain id where applicable.
    pub v: u64,
    /// `r` component, big-endian.
    pub r: [u8; 32],
    /// `s` component, big-endian, canonical low-S.
    pub s: [u8; 32],
}

impl Signature {
    /// Hex-encodes `r`, with a `0x` prefix.
    pub fn r_hex(&self) -> String {
        format!("0x{}", hex::encode(self.r))
    }

    /// Hex-encodes `s`, with a `0x` prefix.
    pub fn s_hex(&self) -> String {
        format!("0x{}", hex::encode(self.s))
    }
}
