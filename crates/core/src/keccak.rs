//! Keccak-256, the hash function Ethereum uses everywhere: addresses,
//! function selectors, RLP transaction hashes, EIP-712 digests.

use tiny_keccak::{Hasher as KeccakHasher, Keccak};

/// Hashes `data` with Keccak-256 (the variant Ethereum uses, distinct
/// from standardized SHA-3).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Streaming Keccak-256 for inputs assembled incrementally (e.g. RLP
/// trees built field by field).
pub struct Keccak256Hasher {
    inner: Keccak,
}

impl Keccak256Hasher {
    /// Starts a new hash.
    pub fn new() -> Self {
        Self {
            inner: Keccak::v256(),
        }
    }

    /// Feeds more data into the hash.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Consumes the hasher and returns the digest.
    pub fn finalize(self) -> [u8; 32] {
        let mut output = [0u8; 32];
        self.inner.finalize(&mut output);
        output
    }
}

impl Default for Keccak256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let hash = keccak256(b"");
        let expected =
            hex_literal::hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470");
        assert_eq!(hash, expected);
    }

    #[test]
    fn hello_world() {
        let hash = keccak256(b"hello world");
        let expected =
            hex_literal::hex!("47173285a8d7341e5e972fc677286384f802f8ef42a5ec5f03bbfa254cb01fad");
        assert_eq!(hash, expected);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Keccak256Hasher::new();
        hasher.update(b"hello");
        hasher.update(b" ");
        hasher.update(b"world");
        assert_eq!(hasher.finalize(), keccak256(b"hello world"));
    }
}
