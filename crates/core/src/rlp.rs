//! Canonical RLP encoding.
//!
//! Only encoding is implemented: this library only ever needs RLP to
//! build outgoing raw transactions, never to parse incoming ones.
//! `RlpError` and `MAX_DEPTH` mirror the teacher's own RLP codec
//! (`apps/xous-ethapp/ethapp/src/parsing/rlp.rs`), which decodes as
//! well as encodes and bounds recursion the same way.

use usdcwallet_types::Error;

/// Maximum nested-list depth this encoder will walk, matching the
/// teacher's decoder bound.
const MAX_DEPTH: usize = 16;

/// RLP encoding failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RlpError {
    /// A `List` nests more than [`MAX_DEPTH`] levels deep.
    TooDeep,
}

impl From<RlpError> for Error {
    fn from(err: RlpError) -> Self {
        match err {
            RlpError::TooDeep => Error::InvalidParameter {
                name: "rlp".into(),
                reason: "nested list exceeds the maximum depth".into(),
            },
        }
    }
}

/// A byte-string-or-list RLP tree ready for encoding.
pub enum RlpItem {
    /// A single byte string (possibly the empty string).
    Bytes(Vec<u8>),
    /// An ordered list of items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Wraps a byte slice as an `RlpItem::Bytes`.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(data.into())
    }

    /// Encodes a `u64` as its canonical minimal big-endian byte string
    /// (zero encodes as the empty string).
    pub fn uint(n: u64) -> Self {
        RlpItem::Bytes(crate::numeric::bytes_from_int(n))
    }

    /// Encodes this item per RLP, rejecting nesting beyond [`MAX_DEPTH`].
    pub fn encode(&self) -> Result<Vec<u8>, RlpError> {
        self.encode_at_depth(0)
    }

    fn encode_at_depth(&self, depth: usize) -> Result<Vec<u8>, RlpError> {
        if depth > MAX_DEPTH {
            return Err(RlpError::TooDeep);
        }
        match self {
            RlpItem::Bytes(data) => Ok(encode_bytes(data)),
            RlpItem::List(items) => {
                let mut body = Vec::new();
                for item in items {
                    body.extend(item.encode_at_depth(depth + 1)?);
                }
                Ok(encode_list_header(body.len()).into_iter().chain(body).collect())
            }
        }
    }
}

/// Encodes a single byte string per RLP: a bare byte if it's a single
/// byte `< 0x80`, otherwise a length-prefixed string.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return vec![data[0]];
    }
    let mut out = encode_length(data.len(), 0x80);
    out.extend_from_slice(data);
    out
}

/// Encodes a `u64` as a minimal RLP byte string.
pub fn encode_u64(n: u64) -> Vec<u8> {
    encode_bytes(&crate::numeric::bytes_from_int(n))
}

/// Encodes a list of already-RLP-encoded items, wrapping them with a
/// list-length prefix.
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = items.iter().map(|i| i.len()).sum();
    let mut out = encode_list_header(body_len);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

fn encode_list_header(body_len: usize) -> Vec<u8> {
    encode_length(body_len, 0xc0)
}

fn encode_length(len: usize, offset: u8) -> Vec<u8> {
    if len < 56 {
        vec![offset + len as u8]
    } else {
        let len_bytes = minimal_be_bytes(len as u64);
        let mut out = vec![offset + 55 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out
    }
}

fn minimal_be_bytes(mut n: u64) -> Vec<u8> {
    if n == 0 {
        return vec![0];
    }
    let mut bytes = Vec::new();
    while n > 0 {
        bytes.push((n & 0xff) as u8);
        n >>= 8;
    }
    bytes.reverse();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_empty_string_as_0x80() {
        assert_eq!(encode_bytes(&[]), vec![0x80]);
    }

    #[test]
    fn encodes_single_small_byte_as_itself() {
        assert_eq!(encode_bytes(&[0x00]), vec![0x00]);
        assert_eq!(encode_bytes(&[0x7f]), vec![0x7f]);
    }

    #[test]
    fn encodes_short_string_with_length_prefix() {
        assert_eq!(encode_bytes(b"dog"), vec![0x83, b'd', b'o', b'g']);
    }

    #[test]
    fn encodes_u64_with_no_leading_zeros() {
        assert_eq!(encode_u64(0), vec![0x80]);
        assert_eq!(encode_u64(1024), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn encodes_list_of_strings() {
        let cat = encode_bytes(b"cat");
        let dog = encode_bytes(b"dog");
        let list = encode_list(&[cat, dog]);
        assert_eq!(
            list,
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
    }

    #[test]
    fn encodes_long_string_with_length_of_length() {
        let data = vec![0x61u8; 56];
        let encoded = encode_bytes(&data);
        assert_eq!(encoded[0], 0xb8);
        assert_eq!(encoded[1], 56);
        assert_eq!(&encoded[2..], data.as_slice());
    }

    #[test]
    fn rlp_item_tree_matches_direct_encoding() {
        let item = RlpItem::List(vec![RlpItem::uint(9), RlpItem::bytes(b"cat".to_vec())]);
        let expected = encode_list(&[encode_u64(9), encode_bytes(b"cat")]);
        assert_eq!(item.encode().unwrap(), expected);
    }

    #[test]
    fn rejects_nesting_beyond_max_depth() {
        let mut item = RlpItem::Bytes(Vec::new());
        for _ in 0..(MAX_DEPTH + 2) {
            item = RlpItem::List(vec![item]);
        }
        assert_eq!(item.encode(), Err(RlpError::TooDeep));
    }
}
