//! EIP-55 checksum casing and validated address parsing.

use usdcwallet_types::{Address, Error};

use crate::keccak::keccak256;

/// Renders `address` with EIP-55 mixed-case checksum casing.
///
/// Each hex digit of the lowercase address is uppercased when the
/// corresponding nibble of `keccak256(lowercase_hex)` is `>= 8`.
pub fn checksum_address(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        if ch.is_ascii_alphabetic() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(ch.to_ascii_uppercase());
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Parses and validates an address string.
///
/// A string that is all-lowercase or all-uppercase hex is accepted
/// without a checksum check (the common "I didn't bother casing it"
/// case). A mixed-case string must match [`checksum_address`] exactly
/// or it is rejected as a probable typo.
pub fn ensure_valid_address(s: &str) -> Result<Address, Error> {
    let address = Address::parse_hex(s)?;
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let all_one_case =
        stripped.chars().all(|c| !c.is_ascii_alphabetic() || c.is_ascii_lowercase())
            || stripped.chars().all(|c| !c.is_ascii_alphabetic() || c.is_ascii_uppercase());
    if all_one_case {
        return Ok(address);
    }
    if checksum_address(&address) != format!("0x{stripped}") {
        return Err(Error::InvalidAddress { value: s.into() });
    }
    Ok(address)
}

/// True iff `s` parses as an address and, if mixed-case, carries a
/// correct checksum.
pub fn is_valid_address(s: &str) -> bool {
    ensure_valid_address(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // https://eips.ethereum.org/EIPS/eip-55 test vectors
    const VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn checksum_matches_eip55_vectors() {
        for v in VECTORS {
            let a = Address::parse_hex(v).unwrap();
            assert_eq!(checksum_address(&a), v);
        }
    }

    #[test]
    fn lowercase_and_uppercase_pass_without_checksum() {
        for v in VECTORS {
            let lower = v.to_ascii_lowercase();
            assert!(is_valid_address(&lower));
            let upper = format!("0x{}", &v[2..].to_ascii_uppercase());
            assert!(is_valid_address(&upper));
        }
    }

    #[test]
    fn mixed_case_with_wrong_checksum_is_rejected() {
        let mut bad = VECTORS[0].to_string();
        bad.replace_range(2..3, &bad[2..3].to_ascii_uppercase());
        if bad == VECTORS[0] {
            bad.replace_range(2..3, &bad[2..3].to_ascii_lowercase());
        }
        assert!(!is_valid_address(&bad));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_address("0x1234"));
    }
}
