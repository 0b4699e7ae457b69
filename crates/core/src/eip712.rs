//! EIP-712 typed structured data hashing.
//!
//! This module only implements the fixed set of EIP-712 structures the
//! USDC contracts actually sign over (`Permit` and
//! `TransferWithAuthorization`) rather than the fully generic
//! `eth_signTypedData` type system. The domain separator itself is not
//! computed here — callers fetch it from the contract's
//! `DOMAIN_SEPARATOR()` method and pass it in, since that is what the
//! contract will actually verify against.

use usdcwallet_types::{Address, Digest};

use crate::abi::{encode_params, AbiType, AbiValue};
use crate::keccak::keccak256;

const EIP191_PREFIX: u8 = 0x19;
const EIP712_VERSION: u8 = 0x01;

/// The EIP-2612 `Permit` struct.
pub struct Permit {
    pub owner: Address,
    pub spender: Address,
    pub value: num_bigint::BigInt,
    pub nonce: num_bigint::BigInt,
    pub deadline: num_bigint::BigInt,
}

impl Permit {
    const TYPE_SIGNATURE: &'static [u8] =
        b"Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

    fn struct_hash(&self) -> Digest {
        let type_hash = keccak256(Self::TYPE_SIGNATURE);
        let types = vec![
            AbiType::FixedBytes(32),
            AbiType::Address,
            AbiType::Address,
            AbiType::Uint(256),
            AbiType::Uint(256),
            AbiType::Uint(256),
        ];
        let values = vec![
            AbiValue::FixedBytes(type_hash.to_vec()),
            AbiValue::Address(self.owner),
            AbiValue::Address(self.spender),
            AbiValue::Uint(self.value.clone()),
            AbiValue::Uint(self.nonce.clone()),
            AbiValue::Uint(self.deadline.clone()),
        ];
        keccak256(&encode_params(&types, &values).expect("permit fields are well-formed"))
    }
}

/// The EIP-3009 `TransferWithAuthorization` struct.
pub struct TransferWithAuthorization {
    pub from: Address,
    pub to: Address,
    pub value: num_bigint::BigInt,
    pub valid_after: num_bigint::BigInt,
    pub valid_before: num_bigint::BigInt,
    pub nonce: Digest,
}

impl TransferWithAuthorization {
    const TYPE_SIGNATURE: &'static [u8] = b"TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)";

    fn struct_hash(&self) -> Digest {
        let type_hash = keccak256(Self::TYPE_SIGNATURE);
        let types = vec![
            AbiType::FixedBytes(32),
            AbiType::Address,
            AbiType::Address,
            AbiType::Uint(256),
            AbiType::Uint(256),
            AbiType::Uint(256),
            AbiType::FixedBytes(32),
        ];
        let values = vec![
            AbiValue::FixedBytes(type_hash.to_vec()),
            AbiValue::Address(self.from),
            AbiValue::Address(self.to),
            AbiValue::Uint(self.value.clone()),
            AbiValue::Uint(self.valid_after.clone()),
            AbiValue::Uint(self.valid_before.clone()),
            AbiValue::FixedBytes(self.nonce.to_vec()),
        ];
        keccak256(&encode_params(&types, &values).expect("authorization fields are well-formed"))
    }
}

/// The message variants this module knows how to hash. Extend here,
/// not with a generic type-graph walker, since the wallet only ever
/// signs over a fixed set of USDC structs.
pub enum TypedMessage {
    Permit(Permit),
    TransferWithAuthorization(TransferWithAuthorization),
}

/// Computes `keccak256(0x19 || 0x01 || domainSeparator || structHash)`,
/// the digest that gets signed for a typed-data message. `domain_separator`
/// is the contract's own `DOMAIN_SEPARATOR()` value, not recomputed here.
pub fn digest(domain_separator: &Digest, message: &TypedMessage) -> Digest {
    let struct_hash = match message {
        TypedMessage::Permit(p) => p.struct_hash(),
        TypedMessage::TransferWithAuthorization(t) => t.struct_hash(),
    };
    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.push(EIP191_PREFIX);
    preimage.push(EIP712_VERSION);
    preimage.extend_from_slice(domain_separator);
    preimage.extend_from_slice(&struct_hash);
    keccak256(&preimage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    const DOMAIN_SEPARATOR: Digest = [0x42; 32];

    #[test]
    fn permit_digest_changes_with_nonce() {
        let owner = Address::parse_hex("0x0000000000000000000000000000000000000001").unwrap();
        let spender = Address::parse_hex("0x0000000000000000000000000000000000000002").unwrap();
        let mk = |nonce: i64| {
            TypedMessage::Permit(Permit {
                owner,
                spender,
                value: BigInt::from(1_000_000),
                nonce: BigInt::from(nonce),
                deadline: BigInt::from(9_999_999_999u64),
            })
        };
        assert_ne!(
            digest(&DOMAIN_SEPARATOR, &mk(0)),
            digest(&DOMAIN_SEPARATOR, &mk(1))
        );
    }

    #[test]
    fn permit_digest_changes_with_domain_separator() {
        let owner = Address::parse_hex("0x0000000000000000000000000000000000000001").unwrap();
        let spender = Address::parse_hex("0x0000000000000000000000000000000000000002").unwrap();
        let message = TypedMessage::Permit(Permit {
            owner,
            spender,
            value: BigInt::from(1_000_000),
            nonce: BigInt::from(0),
            deadline: BigInt::from(9_999_999_999u64),
        });
        let other_separator = [0x24; 32];
        assert_ne!(
            digest(&DOMAIN_SEPARATOR, &message),
            digest(&other_separator, &message)
        );
    }

    #[test]
    fn transfer_authorization_digest_is_deterministic() {
        let from = Address::parse_hex("0x0000000000000000000000000000000000000001").unwrap();
        let to = Address::parse_hex("0x0000000000000000000000000000000000000002").unwrap();
        let message = TypedMessage::TransferWithAuthorization(TransferWithAuthorization {
            from,
            to,
            value: BigInt::from(1_000_000),
            valid_after: BigInt::from(0),
            valid_before: BigInt::from(9_999_999_999u64),
            nonce: [7u8; 32],
        });
        let message2 = TypedMessage::TransferWithAuthorization(TransferWithAuthorization {
            from,
            to,
            value: BigInt::from(1_000_000),
            valid_after: BigInt::from(0),
            valid_before: BigInt::from(9_999_999_999u64),
            nonce: [7u8; 32],
        });
        assert_eq!(
            digest(&DOMAIN_SEPARATOR, &message),
            digest(&DOMAIN_SEPARATOR, &message2)
        );
    }
}
