//! Standard ABI decoding: the inverse of [`super::encode::encode_params`].

use num_bigint::{BigInt, Sign};
use usdcwallet_types::{Address, Error};

use super::types::{AbiError, AbiType, AbiValue, MAX_DEPTH, MAX_DYNAMIC_SIZE, MAX_PARAMS};

const WORD: usize = 32;

/// Decodes `data` against `types` using standard ABI head/tail layout.
pub fn decode_params(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, Error> {
    decode_params_at_depth(types, data, 0)
}

fn decode_params_at_depth(types: &[AbiType], data: &[u8], depth: usize) -> Result<Vec<AbiValue>, Error> {
    if depth > MAX_DEPTH {
        return Err(AbiError::NestingTooDeep.into());
    }
    if types.len() > MAX_PARAMS {
        return Err(AbiError::TooManyParams.into());
    }
    let mut values = Vec::with_capacity(types.len());
    let mut head_offset = 0usize;
    for ty in types {
        let head_width = if ty.is_static() { static_width(ty) } else { WORD };
        let head = read_word_slice(data, head_offset, head_width)?;

        let value = if ty.is_static() {
            decode_static(ty, head, depth)?
        } else {
            let offset = read_usize(&head[..WORD])?;
            decode_dynamic(ty, data, offset, depth)?
        };
        values.push(value);
        head_offset += head_width;
    }
    Ok(values)
}

fn static_width(ty: &AbiType) -> usize {
    match ty {
        AbiType::FixedArray(inner, k) => static_width(inner) * k,
        _ => WORD,
    }
}

fn decode_static(ty: &AbiType, word: &[u8], depth: usize) -> Result<AbiValue, Error> {
    if depth > MAX_DEPTH {
        return Err(AbiError::NestingTooDeep.into());
    }
    match ty {
        AbiType::Uint(bits) => Ok(AbiValue::Uint(decode_uint(&word[..WORD], *bits)?)),
        AbiType::Int(bits) => Ok(AbiValue::Int(decode_int(&word[..WORD], *bits)?)),
        AbiType::Address => Ok(AbiValue::Address(decode_address(&word[..WORD])?)),
        AbiType::Bool => Ok(AbiValue::Bool(word[WORD - 1] != 0)),
        AbiType::FixedBytes(n) => Ok(AbiValue::FixedBytes(word[..*n as usize].to_vec())),
        AbiType::UFixed(bits, _) => Ok(AbiValue::UFixed(decode_uint(&word[..WORD], *bits)?)),
        AbiType::Fixed(bits, _) => Ok(AbiValue::Fixed(decode_int(&word[..WORD], *bits)?)),
        AbiType::FixedArray(inner, k) => {
            if *k > MAX_PARAMS {
                return Err(AbiError::TooManyParams.into());
            }
            let mut items = Vec::with_capacity(*k);
            let item_width = static_width(inner);
            for i in 0..*k {
                let chunk = &word[i * item_width..(i + 1) * item_width];
                items.push(decode_static(inner, chunk, depth + 1)?);
            }
            Ok(AbiValue::Array(items))
        }
        AbiType::Bytes | AbiType::String | AbiType::Array(_) => {
            unreachable!("dynamic types are routed through decode_dynamic")
        }
    }
}

fn decode_dynamic(ty: &AbiType, data: &[u8], offset: usize, depth: usize) -> Result<AbiValue, Error> {
    if depth > MAX_DEPTH {
        return Err(AbiError::NestingTooDeep.into());
    }
    match ty {
        AbiType::Bytes => Ok(AbiValue::Bytes(read_dynamic_bytes(data, offset)?)),
        AbiType::String => {
            let bytes = read_dynamic_bytes(data, offset)?;
            String::from_utf8(bytes)
                .map(AbiValue::String)
                .map_err(|_| AbiError::InvalidUtf8.into())
        }
        AbiType::Array(inner) => {
            let length = read_usize(read_word_slice(data, offset, WORD)?)?;
            if length > MAX_PARAMS {
                return Err(AbiError::TooManyParams.into());
            }
            let inner_types: Vec<AbiType> = std::iter::repeat((**inner).clone()).take(length).collect();
            let body = data
                .get(offset + WORD..)
                .ok_or(AbiError::InvalidOffset)?;
            Ok(AbiValue::Array(decode_params_at_depth(&inner_types, body, depth + 1)?))
        }
        AbiType::FixedArray(inner, k) if !inner.is_static() => {
            if *k > MAX_PARAMS {
                return Err(AbiError::TooManyParams.into());
            }
            let inner_types: Vec<AbiType> = std::iter::repeat((**inner).clone()).take(*k).collect();
            let body = data.get(offset..).ok_or(AbiError::InvalidOffset)?;
            Ok(AbiValue::Array(decode_params_at_depth(&inner_types, body, depth + 1)?))
        }
        _ => Err(Error::InvalidParameter {
            name: "type".into(),
            reason: "not a dynamic type".into(),
        }),
    }
}

fn read_dynamic_bytes(data: &[u8], offset: usize) -> Result<Vec<u8>, Error> {
    let length = read_usize(read_word_slice(data, offset, WORD)?)?;
    if length > MAX_DYNAMIC_SIZE {
        return Err(AbiError::DataTooLarge.into());
    }
    let start = offset + WORD;
    data.get(start..start + length)
        .map(|s| s.to_vec())
        .ok_or_else(|| AbiError::DataTooShort.into())
}

fn read_word_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], Error> {
    data.get(offset..offset + len).ok_or_else(|| AbiError::DataTooShort.into())
}

fn read_usize(word: &[u8]) -> Result<usize, Error> {
    if word[..WORD - 8].iter().any(|&b| b != 0) {
        return Err(Error::Overflow {
            context: "abi offset/length exceeds usize".into(),
        });
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(buf) as usize)
}

fn decode_uint(word: &[u8], bits: u16) -> Result<BigInt, Error> {
    let value = BigInt::from_bytes_be(Sign::Plus, word);
    let max = (BigInt::from(1) << bits as u32) - BigInt::from(1);
    if value > max {
        return Err(Error::AbiWidthExceeded { declared_bits: bits });
    }
    Ok(value)
}

fn decode_int(word: &[u8], bits: u16) -> Result<BigInt, Error> {
    let unsigned = BigInt::from_bytes_be(Sign::Plus, word);
    let modulus = BigInt::from(1) << 256u32;
    let half = BigInt::from(1) << 255u32;
    let value = if unsigned >= half {
        unsigned - modulus
    } else {
        unsigned
    };
    let bound = BigInt::from(1) << (bits as u32 - 1);
    if value >= bound || value < -bound {
        return Err(Error::AbiWidthExceeded { declared_bits: bits });
    }
    Ok(value)
}

fn decode_address(word: &[u8]) -> Result<Address, Error> {
    if word[..12].iter().any(|&b| b != 0) {
        return Err(Error::InvalidAddress {
            value: hex::encode(word),
        });
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::super::encode::encode_params;
    use super::*;

    #[test]
    fn round_trips_transfer_arguments() {
        let address = Address::parse_hex("0xaAaAaAaAaAaaaAAAAAAAaaaaAAAaAaaaAaaAaAaa").unwrap();
        let types = vec![AbiType::Address, AbiType::Uint(256)];
        let values = vec![
            AbiValue::Address(address),
            AbiValue::Uint(BigInt::from(12_340_000)),
        ];
        let encoded = encode_params(&types, &values).unwrap();
        let decoded = decode_params(&types, &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn round_trips_string_and_bytes() {
        let types = vec![AbiType::String, AbiType::Bytes];
        let values = vec![
            AbiValue::String("usdc".into()),
            AbiValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
        ];
        let encoded = encode_params(&types, &values).unwrap();
        let decoded = decode_params(&types, &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn round_trips_fixed_point_values() {
        let types = vec![AbiType::UFixed(128, 18), AbiType::Fixed(128, 18)];
        let values = vec![
            AbiValue::UFixed(BigInt::from(1_500_000_000_000_000_000u64)),
            AbiValue::Fixed(BigInt::from(-1_500_000_000_000_000_000i64)),
        ];
        let encoded = encode_params(&types, &values).unwrap();
        let decoded = decode_params(&types, &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn rejects_truncated_payload() {
        let types = vec![AbiType::Uint(256), AbiType::Uint(256)];
        assert!(decode_params(&types, &[0u8; 32]).is_err());
    }

    #[test]
    fn round_trips_dynamic_array() {
        let types = vec![AbiType::Array(Box::new(AbiType::Uint(256)))];
        let values = vec![AbiValue::Array(vec![
            AbiValue::Uint(BigInt::from(7)),
            AbiValue::Uint(BigInt::from(9)),
        ])];
        let encoded = encode_params(&types, &values).unwrap();
        let decoded = decode_params(&types, &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn rejects_more_than_max_params() {
        let types: Vec<AbiType> = std::iter::repeat(AbiType::Uint(256)).take(MAX_PARAMS + 1).collect();
        let data = vec![0u8; WORD * (MAX_PARAMS + 1)];
        assert_eq!(decode_params(&types, &data), Err(AbiError::TooManyParams.into()));
    }

    #[test]
    fn rejects_dynamic_array_longer_than_max_params() {
        let types = vec![AbiType::Array(Box::new(AbiType::Uint(256)))];
        let mut data = vec![0u8; WORD];
        data[WORD - 8..].copy_from_slice(&(WORD as u64).to_be_bytes());
        let mut length_word = vec![0u8; WORD];
        let too_many = (MAX_PARAMS + 1) as u64;
        length_word[WORD - 8..].copy_from_slice(&too_many.to_be_bytes());
        data.extend_from_slice(&length_word);
        assert_eq!(decode_params(&types, &data), Err(AbiError::TooManyParams.into()));
    }

    #[test]
    fn rejects_string_with_length_beyond_max_dynamic_size() {
        let types = vec![AbiType::String];
        let mut data = vec![0u8; WORD];
        data[WORD - 8..].copy_from_slice(&(WORD as u64).to_be_bytes());
        let mut length_word = vec![0u8; WORD];
        let too_large = (MAX_DYNAMIC_SIZE + 1) as u64;
        length_word[WORD - 8..].copy_from_slice(&too_large.to_be_bytes());
        data.extend_from_slice(&length_word);
        assert_eq!(decode_params(&types, &data), Err(AbiError::DataTooLarge.into()));
    }
}
