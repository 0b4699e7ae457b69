//! The subset of the Solidity ABI type system this crate encodes and
//! decodes: value types, fixed arrays, and dynamic arrays of either.

use num_bigint::BigInt;
use usdcwallet_types::{Address, Error};

/// Bound on the number of top-level parameters a single `decode_params`
/// call will walk, mirroring the teacher's calldata decoder's own
/// denial-of-service guard (`apps/ethereum/app/src/parsing/abi.rs`).
pub(crate) const MAX_PARAMS: usize = 32;

/// Bound on nested array/tuple depth, same provenance as [`MAX_PARAMS`].
pub(crate) const MAX_DEPTH: usize = 8;

/// Bound on a single dynamic `bytes`/`string` value's length.
pub(crate) const MAX_DYNAMIC_SIZE: usize = 1024 * 1024;

/// Internal decoding failures, named after the teacher's own `AbiError`.
/// Converted to the crate-wide [`Error`] at the `decode_params`
/// boundary rather than exposed directly, so callers keep matching on
/// one error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbiError {
    /// Not enough bytes remain to read a declared word or tail value.
    DataTooShort,
    /// A dynamic value's offset points outside the payload.
    InvalidOffset,
    /// More top-level parameters than [`MAX_PARAMS`].
    TooManyParams,
    /// Nested type exceeds [`MAX_DEPTH`].
    NestingTooDeep,
    /// A `string` value's bytes are not valid UTF-8.
    InvalidUtf8,
    /// A dynamic value's declared length exceeds [`MAX_DYNAMIC_SIZE`].
    DataTooLarge,
}

impl From<AbiError> for Error {
    fn from(err: AbiError) -> Self {
        let reason = match err {
            AbiError::DataTooShort => "truncated ABI payload",
            AbiError::InvalidOffset => "offset points outside the payload",
            AbiError::TooManyParams => "parameter count exceeds the maximum",
            AbiError::NestingTooDeep => "nested type exceeds the maximum depth",
            AbiError::InvalidUtf8 => "string parameter is not valid UTF-8",
            AbiError::DataTooLarge => "dynamic value exceeds the maximum size",
        };
        Error::InvalidParameter {
            name: "abi".into(),
            reason: reason.into(),
        }
    }
}

/// An ABI parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    /// `uintN`, `8 <= N <= 256`, `N % 8 == 0`.
    Uint(u16),
    /// `intN`, `8 <= N <= 256`, `N % 8 == 0`.
    Int(u16),
    /// `address`.
    Address,
    /// `bool`.
    Bool,
    /// `bytesN`, `1 <= N <= 32`.
    FixedBytes(u8),
    /// `bytes`.
    Bytes,
    /// `string`.
    String,
    /// `ufixedNxM`: unsigned, `N` total bits, `M` fractional decimal digits.
    UFixed(u16, u8),
    /// `fixedNxM`: signed, `N` total bits, `M` fractional decimal digits.
    Fixed(u16, u8),
    /// `T[]`.
    Array(Box<AbiType>),
    /// `T[k]`.
    FixedArray(Box<AbiType>, usize),
}

impl AbiType {
    /// True for types whose encoding is a single 32-byte word in the head.
    pub fn is_static(&self) -> bool {
        match self {
            AbiType::Uint(_)
            | AbiType::Int(_)
            | AbiType::Address
            | AbiType::Bool
            | AbiType::FixedBytes(_)
            | AbiType::UFixed(_, _)
            | AbiType::Fixed(_, _) => true,
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => false,
            AbiType::FixedArray(inner, _) => inner.is_static(),
        }
    }
}

/// A decoded or to-be-encoded ABI value.
#[derive(Debug, Clone, PartialEq)]
pub enum AbiValue {
    /// `uintN`, always non-negative.
    Uint(BigInt),
    /// `intN`, two's-complement signed.
    Int(BigInt),
    /// `address`.
    Address(Address),
    /// `bool`.
    Bool(bool),
    /// `bytesN`, exactly `N` bytes.
    FixedBytes(Vec<u8>),
    /// `bytes`, arbitrary length.
    Bytes(Vec<u8>),
    /// `string`, UTF-8.
    String(String),
    /// `ufixedNxM`, stored already scaled by `2^M` (the wire integer).
    UFixed(BigInt),
    /// `fixedNxM`, stored already scaled by `2^M` (the wire integer).
    Fixed(BigInt),
    /// `T[]` or `T[k]`.
    Array(Vec<AbiValue>),
}
