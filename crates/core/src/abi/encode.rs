//! Standard ABI head/tail encoding, plus the non-standard "packed"
//! encoding Solidity's `abi.encodePacked` (and `soliditySha3` helper
//! libraries built on it) use.

use num_bigint::{BigInt, Sign};
use usdcwallet_types::{Address, Error};

use super::types::{AbiType, AbiValue};

const WORD: usize = 32;

/// Encodes `values` against `types` using standard ABI head/tail
/// layout (the encoding used for calldata and event data).
pub fn encode_params(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, Error> {
    if types.len() != values.len() {
        return Err(Error::InvalidParameter {
            name: "values".into(),
            reason: format!("expected {} values, got {}", types.len(), values.len()),
        });
    }

    let mut parts = Vec::with_capacity(types.len());
    for (ty, value) in types.iter().zip(values) {
        parts.push(encode_value(ty, value)?);
    }

    let head_size: usize = parts
        .iter()
        .map(|(dynamic, bytes)| if *dynamic { WORD } else { bytes.len() })
        .sum();

    let mut head = Vec::new();
    let mut tail = Vec::new();
    for (dynamic, bytes) in parts {
        if dynamic {
            head.extend_from_slice(&word_from_usize(head_size + tail.len()));
            tail.extend_from_slice(&bytes);
        } else {
            head.extend_from_slice(&bytes);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Encodes a single value, returning `(is_dynamic, bytes)`. For a
/// dynamic value the bytes are the tail content (no leading offset);
/// for a static value the bytes are the head content verbatim (which
/// may span more than one word, e.g. a fixed array of static values).
fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<(bool, Vec<u8>), Error> {
    match (ty, value) {
        (AbiType::Uint(bits), AbiValue::Uint(n)) => Ok((false, uint_word(n, *bits)?.to_vec())),
        (AbiType::Int(bits), AbiValue::Int(n)) => Ok((false, int_word(n, *bits)?.to_vec())),
        (AbiType::Address, AbiValue::Address(a)) => Ok((false, address_word(a).to_vec())),
        (AbiType::Bool, AbiValue::Bool(b)) => Ok((false, bool_word(*b).to_vec())),
        (AbiType::FixedBytes(n), AbiValue::FixedBytes(bytes)) => {
            Ok((false, fixed_bytes_word(bytes, *n)?.to_vec()))
        }
        (AbiType::UFixed(bits, _), AbiValue::UFixed(n)) => Ok((false, uint_word(n, *bits)?.to_vec())),
        (AbiType::Fixed(bits, _), AbiValue::Fixed(n)) => Ok((false, int_word(n, *bits)?.to_vec())),
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => Ok((true, encode_dynamic_bytes(bytes))),
        (AbiType::String, AbiValue::String(s)) => Ok((true, encode_dynamic_bytes(s.as_bytes()))),
        (AbiType::Array(inner), AbiValue::Array(items)) => {
            let mut out = word_from_usize(items.len()).to_vec();
            let inner_types: Vec<AbiType> = std::iter::repeat(*inner.clone()).take(items.len()).collect();
            out.extend_from_slice(&encode_params(&inner_types, items)?);
            Ok((true, out))
        }
        (AbiType::FixedArray(inner, k), AbiValue::Array(items)) => {
            if items.len() != *k {
                return Err(Error::InvalidParameter {
                    name: "array".into(),
                    reason: format!("expected {k} elements, got {}", items.len()),
                });
            }
            let inner_types: Vec<AbiType> = std::iter::repeat(*inner.clone()).take(*k).collect();
            let dynamic = !inner.is_static();
            Ok((dynamic, encode_params(&inner_types, items)?))
        }
        _ => Err(Error::InvalidParameter {
            name: "value".into(),
            reason: "type/value mismatch".into(),
        }),
    }
}

fn word_from_usize(n: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn uint_word(n: &BigInt, bits: u16) -> Result<[u8; 32], Error> {
    if n.sign() == Sign::Minus {
        return Err(Error::InvalidParameter {
            name: "uint".into(),
            reason: "negative value for unsigned type".into(),
        });
    }
    let max = (BigInt::from(1) << bits as u32) - BigInt::from(1);
    if n > &max {
        return Err(Error::AbiWidthExceeded { declared_bits: bits });
    }
    let (_, bytes) = n.to_bytes_be();
    if bytes.len() > WORD {
        return Err(Error::AbiWidthExceeded { declared_bits: bits });
    }
    let mut word = [0u8; 32];
    word[WORD - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

fn int_word(n: &BigInt, bits: u16) -> Result<[u8; 32], Error> {
    let half = BigInt::from(1) << (bits as u32 - 1);
    if n >= &(-half.clone()) && n < &half {
        // fits; fall through to two's-complement encoding below
    } else {
        return Err(Error::AbiWidthExceeded { declared_bits: bits });
    }

    let modulus = BigInt::from(1) << 256u32;
    let unsigned = if n.sign() == Sign::Minus {
        (n + &modulus) % &modulus
    } else {
        n.clone()
    };
    let (_, bytes) = unsigned.to_bytes_be();
    let mut word = [0xff_u8; 32];
    if n.sign() != Sign::Minus {
        word = [0u8; 32];
    }
    if bytes.len() <= WORD {
        word[WORD - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(word)
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn bool_word(b: bool) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[31] = b as u8;
    word
}

fn fixed_bytes_word(bytes: &[u8], n: u8) -> Result<[u8; 32], Error> {
    if bytes.len() != n as usize {
        return Err(Error::InvalidParameter {
            name: "fixed_bytes".into(),
            reason: format!("expected {n} bytes, got {}", bytes.len()),
        });
    }
    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(word)
}

fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = word_from_usize(bytes.len()).to_vec();
    out.extend_from_slice(bytes);
    let padding = (WORD - (bytes.len() % WORD)) % WORD;
    out.extend(std::iter::repeat(0u8).take(padding));
    out
}

/// Encodes `values` the way Solidity's `abi.encodePacked` does: no
/// offsets, no length-prefixing of arrays, and each value written at
/// its minimal natural width (dynamic types are concatenated raw).
/// This is what `soliditySha3`-style helpers hash.
pub fn encode_packed(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, Error> {
    if types.len() != values.len() {
        return Err(Error::InvalidParameter {
            name: "values".into(),
            reason: format!("expected {} values, got {}", types.len(), values.len()),
        });
    }
    let mut out = Vec::new();
    for (ty, value) in types.iter().zip(values) {
        encode_packed_value(ty, value, &mut out)?;
    }
    Ok(out)
}

fn encode_packed_value(ty: &AbiType, value: &AbiValue, out: &mut Vec<u8>) -> Result<(), Error> {
    match (ty, value) {
        (AbiType::Uint(bits), AbiValue::Uint(n)) => {
            let word = uint_word(n, *bits)?;
            out.extend_from_slice(&word[WORD - (*bits as usize / 8)..]);
        }
        (AbiType::Int(bits), AbiValue::Int(n)) => {
            let word = int_word(n, *bits)?;
            out.extend_from_slice(&word[WORD - (*bits as usize / 8)..]);
        }
        (AbiType::Address, AbiValue::Address(a)) => out.extend_from_slice(a.as_bytes()),
        (AbiType::Bool, AbiValue::Bool(b)) => out.push(*b as u8),
        (AbiType::FixedBytes(n), AbiValue::FixedBytes(bytes)) => {
            if bytes.len() != *n as usize {
                return Err(Error::InvalidParameter {
                    name: "fixed_bytes".into(),
                    reason: format!("expected {n} bytes, got {}", bytes.len()),
                });
            }
            out.extend_from_slice(bytes);
        }
        (AbiType::UFixed(bits, _), AbiValue::UFixed(n)) => {
            let word = uint_word(n, *bits)?;
            out.extend_from_slice(&word[WORD - (*bits as usize / 8)..]);
        }
        (AbiType::Fixed(bits, _), AbiValue::Fixed(n)) => {
            let word = int_word(n, *bits)?;
            out.extend_from_slice(&word[WORD - (*bits as usize / 8)..]);
        }
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => out.extend_from_slice(bytes),
        (AbiType::String, AbiValue::String(s)) => out.extend_from_slice(s.as_bytes()),
        (AbiType::Array(inner), AbiValue::Array(items))
        | (AbiType::FixedArray(inner, _), AbiValue::Array(items)) => {
            for item in items {
                encode_packed_value(inner, item, out)?;
            }
        }
        _ => {
            return Err(Error::InvalidParameter {
                name: "value".into(),
                reason: "type/value mismatch".into(),
            })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_transfer_with_six_decimals() {
        // transfer(0xaAaA...aAaa, "12.34" at 6 decimals == 12_340_000)
        let address = Address::parse_hex("0xaAaAaAaAaAaaaAAAAAAAaaaaAAAaAaaaAaaAaAaa").unwrap();
        let types = vec![AbiType::Address, AbiType::Uint(256)];
        let values = vec![
            AbiValue::Address(address),
            AbiValue::Uint(BigInt::from(12_340_000)),
        ];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(encoded.len(), 64);
        assert_eq!(&encoded[12..32], address.as_bytes());
        assert_eq!(encoded[56..], 12_340_000u64.to_be_bytes());
    }

    #[test]
    fn encodes_dynamic_bytes_with_length_prefix_and_padding() {
        let types = vec![AbiType::Bytes];
        let values = vec![AbiValue::Bytes(vec![1, 2, 3])];
        let encoded = encode_params(&types, &values).unwrap();
        // offset word, then length word, then 1 word of padded data
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[63], 32); // offset = 32
        assert_eq!(encoded[95], 3); // length = 3
    }

    #[test]
    fn rejects_uint_overflow() {
        let types = vec![AbiType::Uint(8)];
        let values = vec![AbiValue::Uint(BigInt::from(256))];
        assert!(encode_params(&types, &values).is_err());
    }

    #[test]
    fn encodes_negative_int_as_twos_complement() {
        let types = vec![AbiType::Int(256)];
        let values = vec![AbiValue::Int(BigInt::from(-1))];
        let encoded = encode_params(&types, &values).unwrap();
        assert_eq!(encoded, vec![0xffu8; 32]);
    }

    #[test]
    fn packed_encoding_has_no_padding() {
        let types = vec![AbiType::Uint(8), AbiType::Bool];
        let values = vec![AbiValue::Uint(BigInt::from(1)), AbiValue::Bool(true)];
        let packed = encode_packed(&types, &values).unwrap();
        assert_eq!(packed, vec![1u8, 1u8]);
    }

    #[test]
    fn encodes_dynamic_array_of_uints() {
        let types = vec![AbiType::Array(Box::new(AbiType::Uint(256)))];
        let values = vec![AbiValue::Array(vec![
            AbiValue::Uint(BigInt::from(1)),
            AbiValue::Uint(BigInt::from(2)),
        ])];
        let encoded = encode_params(&types, &values).unwrap();
        // offset word + length word + 2 element words
        assert_eq!(encoded.len(), 128);
    }
}
