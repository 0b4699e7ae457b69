//! Ethereum ABI type system, standard encode/decode, packed encoding,
//! and function selector computation.

mod decode;
mod encode;
mod selector;
mod types;

pub use decode::decode_params;
pub use encode::{encode_packed, encode_params};
pub use selector::{calldata, selector};
pub use types::{AbiType, AbiValue};
