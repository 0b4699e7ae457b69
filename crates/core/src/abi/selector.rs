//! Function selectors: the first 4 bytes of `keccak256(signature)`.

use crate::keccak::keccak256;

/// Computes the 4-byte selector for a canonical function signature such
/// as `"transfer(address,uint256)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Builds calldata by prefixing `encoded_params` with the selector for
/// `signature`.
pub fn calldata(signature: &str, encoded_params: &[u8]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(encoded_params);
    out
}
