//! BIP-39 mnemonics and BIP-32/44 hierarchical key derivation.

use bip32::{ChildNumber, XPrv};
use bip39::Mnemonic;
use zeroize::Zeroizing;

use usdcwallet_types::{Bip32Path, Error, HARDENED};

use crate::account::Account;

/// An HD wallet seeded from a BIP-39 mnemonic, deriving accounts along
/// BIP-44 paths on demand.
pub struct HdWallet {
    seed: Zeroizing<[u8; 64]>,
}

impl HdWallet {
    /// Generates a new wallet with a fresh English mnemonic of the given
    /// word count (12 or 24).
    pub fn generate(word_count: usize) -> Result<(Self, Mnemonic), Error> {
        let entropy_bits = match word_count {
            12 => 128,
            24 => 256,
            _ => {
                return Err(Error::InvalidParameter {
                    name: "word_count".into(),
                    reason: "must be 12 or 24".into(),
                })
            }
        };
        let mut entropy = vec![0u8; entropy_bits / 8];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy).map_err(|e| Error::InvalidPhrase {
            reason: e.to_string(),
        })?;
        let wallet = Self::from_mnemonic(&mnemonic.to_string(), "")?;
        Ok((wallet, mnemonic))
    }

    /// Parses an existing mnemonic (any supported word count) and an
    /// optional BIP-39 passphrase into a seeded wallet.
    pub fn from_mnemonic(phrase: &str, passphrase: &str) -> Result<Self, Error> {
        let mnemonic = phrase
            .parse::<Mnemonic>()
            .map_err(|e| Error::InvalidPhrase {
                reason: e.to_string(),
            })?;
        let seed = mnemonic.to_seed(passphrase);
        Ok(Self {
            seed: Zeroizing::new(seed),
        })
    }

    /// Derives the account at `path`.
    pub fn account_for_path(&self, path: &Bip32Path) -> Result<Account, Error> {
        let mut node = XPrv::new(&*self.seed).map_err(|e| Error::InvalidParameter {
            name: "seed".into(),
            reason: e.to_string(),
        })?;
        for &component in path.as_slice() {
            let hardened = component & HARDENED != 0;
            let index = component & !HARDENED;
            let child_number = ChildNumber::new(index, hardened).map_err(|e| {
                Error::InvalidParameter {
                    name: "path".into(),
                    reason: e.to_string(),
                }
            })?;
            node = node.derive_child(child_number).map_err(|e| Error::InvalidParameter {
                name: "path".into(),
                reason: e.to_string(),
            })?;
        }
        let key_bytes: [u8; 32] = node.private_key().to_bytes().into();
        Account::from_private_key(key_bytes)
    }

    /// Derives the account at `m/44'/60'/0'/0/{account_index}`, the
    /// default Ethereum path.
    pub fn select_account(&self, account_index: u32) -> Result<Account, Error> {
        self.account_for_path(&Bip32Path::ethereum_default(account_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The well-known Hardhat/Anvil development mnemonic, whose account 0
    // under m/44'/60'/0'/0/0 is 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266.
    const TEST_PHRASE: &str =
        "test test test test test test test test test test test junk";

    #[test]
    fn parses_known_mnemonic() {
        let wallet = HdWallet::from_mnemonic(TEST_PHRASE, "").unwrap();
        let account = wallet.select_account(0).unwrap();
        assert_eq!(
            account.address().to_string(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn different_indices_derive_different_accounts() {
        let wallet = HdWallet::from_mnemonic(TEST_PHRASE, "").unwrap();
        let a0 = wallet.select_account(0).unwrap();
        let a1 = wallet.select_account(1).unwrap();
        assert_ne!(a0.address(), a1.address());
    }

    #[test]
    fn rejects_invalid_phrase() {
        assert!(HdWallet::from_mnemonic("not a real mnemonic phrase at all", "").is_err());
    }

    #[test]
    fn generate_produces_a_usable_wallet() {
        let (wallet, mnemonic) = HdWallet::generate(12).unwrap();
        assert_eq!(mnemonic.word_count(), 12);
        assert!(wallet.select_account(0).is_ok());
    }
}
