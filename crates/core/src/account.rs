//! A single secp256k1 keypair: derives its checksum address and signs
//! 32-byte digests with recoverable, low-S ECDSA signatures.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use usdcwallet_types::{Address, Signature};

use crate::address::checksum_address;
use crate::keccak::keccak256;

/// A private key paired with its derived address.
///
/// `SigningKey` zeroizes its scalar on drop; `Debug` never prints key
/// material.
pub struct Account {
    signing_key: SigningKey,
    address: Address,
}

impl Account {
    /// Builds an account from a raw 32-byte private key.
    pub fn from_private_key(key: [u8; 32]) -> Result<Self, usdcwallet_types::Error> {
        let signing_key = SigningKey::from_slice(&key).map_err(|_| {
            usdcwallet_types::Error::InvalidParameter {
                name: "private_key".into(),
                reason: "not a valid secp256k1 scalar".into(),
            }
        })?;
        let address = address_from_signing_key(&signing_key);
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// The account's checksum-cased Ethereum address.
    pub fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Signs a pre-computed 32-byte digest (the caller is responsible
    /// for hashing/prefixing per whatever convention applies: raw
    /// transaction hash, EIP-191 personal-sign digest, EIP-712 digest).
    ///
    /// `chain_id` selects the `v` convention: `Some(id)` applies EIP-155
    /// (`v = recid + 2*id + 35`), `None` uses the legacy `v = recid + 27`.
    pub fn sign_digest(&self, digest: &[u8; 32], chain_id: Option<u64>) -> Signature {
        let (sig, recid) = sign_prehash_recoverable(&self.signing_key, digest);
        let v = match chain_id {
            Some(id) => recid.to_byte() as u64 + 2 * id + 35,
            None => recid.to_byte() as u64 + 27,
        };
        let r_bytes: [u8; 32] = sig.r().to_bytes().into();
        let s_bytes: [u8; 32] = sig.s().to_bytes().into();
        Signature {
            v,
            r: r_bytes,
            s: s_bytes,
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address.to_string())
            .finish_non_exhaustive()
    }
}

fn sign_prehash_recoverable(key: &SigningKey, digest: &[u8; 32]) -> (EcdsaSignature, RecoveryId) {
    // k256 always normalizes to the canonical low-S form.
    key.sign_prehash_recoverable(digest)
        .expect("32-byte digest is a valid prehash input")
}

fn address_from_signing_key(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let pubkey_bytes = &point.as_bytes()[1..]; // drop the 0x04 prefix
    let hash = keccak256(pubkey_bytes);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

/// Renders `account`'s address with EIP-55 checksum casing.
pub fn checksummed(account: &Account) -> String {
    checksum_address(&account.address())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The well-known Hardhat/Anvil default account #0 keypair.
    const TEST_KEY: [u8; 32] = hex_literal::hex!(
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
    );
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn address_is_deterministic_for_known_key() {
        let account = Account::from_private_key(TEST_KEY).unwrap();
        assert_eq!(account.address().to_string(), TEST_ADDRESS);
    }

    #[test]
    fn signature_v_follows_eip155() {
        let account = Account::from_private_key(TEST_KEY).unwrap();
        let digest = keccak256(b"test message");
        let sig = account.sign_digest(&digest, Some(1));
        assert!(sig.v == 37 || sig.v == 38);
    }

    #[test]
    fn legacy_v_without_chain_id_is_27_or_28() {
        let account = Account::from_private_key(TEST_KEY).unwrap();
        let digest = keccak256(b"test message");
        let sig = account.sign_digest(&digest, None);
        assert!(sig.v == 27 || sig.v == 28);
    }

    #[test]
    fn different_keys_derive_different_addresses() {
        let mut other_key = TEST_KEY;
        other_key[31] ^= 0x01;
        let a = Account::from_private_key(TEST_KEY).unwrap();
        let b = Account::from_private_key(other_key).unwrap();
        assert_ne!(a.address(), b.address());
    }
}
