//! Cryptography, codecs, and key derivation for the USDC wallet library.
//!
//! Nothing in this crate talks to the network; that lives in
//! `usdcwallet-client`, which composes these primitives with an async
//! JSON-RPC transport.

pub mod abi;
pub mod account;
pub mod address;
pub mod eip712;
pub mod hdwallet;
pub mod keccak;
pub mod numeric;
pub mod rlp;

pub use account::Account;
pub use hdwallet::HdWallet;
