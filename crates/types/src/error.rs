//! Error types shared across the wallet library.
//!
//! Every fallible operation returns one of these variants rather than a
//! formatted string, so callers can match on the failure instead of
//! parsing a message.

use std::fmt;

/// A structured error produced anywhere in the wallet library.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed hexadecimal input.
    InvalidHex {
        /// The offending value, if available.
        value: String,
    },
    /// An address failed validation.
    InvalidAddress {
        /// The offending value.
        value: String,
    },
    /// Malformed or negative decimal string.
    InvalidDecimal {
        /// The offending value.
        value: String,
    },
    /// Numeric result exceeds the declared width or the safe-integer bound.
    Overflow {
        /// What overflowed, for diagnostics.
        context: String,
    },
    /// A builder or setter constraint was violated (range, mutual exclusion).
    InvalidParameter {
        /// Name of the offending field.
        name: String,
        /// Human-readable reason.
        reason: String,
    },
    /// A recovery phrase failed mnemonic parsing.
    InvalidPhrase {
        /// Underlying parser message.
        reason: String,
    },
    /// An encoded or decoded ABI value exceeded its declared width.
    AbiWidthExceeded {
        /// Declared width in bits.
        declared_bits: u16,
    },
    /// Chain identifier has no known contract mapping and no override was set.
    UnsupportedChain {
        /// The chain id that was rejected.
        chain_id: u64,
    },
    /// The JSON-RPC endpoint returned an error, or the HTTP exchange failed.
    Rpc {
        /// Error message (from the RPC body, or a transport-level message).
        message: String,
        /// JSON-RPC error code, or 0 if there was none.
        code: i64,
        /// Optional JSON-RPC error data, serialized.
        data: Option<String>,
        /// HTTP status code, or 0 if the transport never got a response.
        status: u16,
    },
    /// `waitForReceipt` exceeded its timeout.
    Timeout {
        /// Seconds waited before giving up.
        waited_secs: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidHex { value } => write!(f, "invalid hex string: {value}"),
            Error::InvalidAddress { value } => write!(f, "invalid address: {value}"),
            Error::InvalidDecimal { value } => write!(f, "invalid decimal string: {value}"),
            Error::Overflow { context } => write!(f, "numeric overflow: {context}"),
            Error::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
            Error::InvalidPhrase { reason } => write!(f, "invalid recovery phrase: {reason}"),
            Error::AbiWidthExceeded { declared_bits } => {
                write!(f, "value exceeds declared width of {declared_bits} bits")
            }
            Error::UnsupportedChain { chain_id } => {
                write!(f, "unsupported chain id {chain_id}")
            }
            Error::Rpc {
                message,
                code,
                status,
                ..
            } => write!(f, "rpc error {code} (http {status}): {message}"),
            Error::Timeout { waited_secs } => {
                write!(f, "timed out after {waited_secs}s waiting for receipt")
            }
        }
    }
}

impl std::error::Error for Error {}
