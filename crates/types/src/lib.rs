//! Shared value types and error codes for the USDC wallet library.
//!
//! This crate has no cryptographic dependencies; it exists so that
//! `usdcwallet-core` (codecs, signing) and `usdcwallet-client` (RPC,
//! transaction submission) can agree on a common vocabulary without
//! either depending on the other.

pub mod address;
pub mod bip32;
pub mod error;
pub mod signature;

pub use address::Address;
pub use bip32::{Bip32Path, HARDENED};
pub use error::Error;
pub use signature::Signature;

/// A Keccak-256 digest.
pub type Digest = [u8; 32];
