//! BIP-32/BIP-44 derivation path.

use std::fmt;

/// Bit set on a path component to mark it hardened.
pub const HARDENED: u32 = 0x8000_0000;

/// Maximum derivation path depth this library will derive through.
pub const MAX_PATH_DEPTH: usize = 10;

/// A BIP-32 derivation path, stored as raw `u32` components with the
/// hardened bit folded in (matching the wire representation used by
/// HD derivation libraries).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bip32Path(Vec<u32>);

impl Bip32Path {
    /// An empty path.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wraps pre-built components.
    pub fn from_components(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// The default USDC/Ethereum wallet path, `m/44'/60'/0'/0`, with the
    /// given account index appended as the final, non-hardened component.
    pub fn ethereum_default(account_index: u32) -> Self {
        Self(vec![44 | HARDENED, 60 | HARDENED, HARDENED, 0, account_index])
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the path has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw components, in derivation order.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for Bip32Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for &component in &self.0 {
            let hardened = component & HARDENED != 0;
            let index = component & !HARDENED;
            if hardened {
                write!(f, "/{index}'")?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_matches_bip44() {
        let path = Bip32Path::ethereum_default(3);
        assert_eq!(path.to_string(), "m/44'/60'/0'/0/3");
    }
}
