//! Hex, big-integer and decimal-string conversions.
//!
//! These are the primitives everything else in the crate builds on:
//! ABI words, RLP fields and RPC parameters are all ultimately hex
//! strings or big-endian byte strings underneath.

use num_bigint::{BigInt, Sign};
use num_traits::Zero;
use usdcwallet_types::Error;

/// `u256::MAX`, used as the default deadline/expiry for permits and
/// transfer authorizations when the caller does not supply one.
pub fn max_uint256() -> BigInt {
    (BigInt::from(1) << 256) - BigInt::from(1)
}

/// True for the empty string or any string matching `(0x)?[0-9a-fA-F]*`.
pub fn is_hex(s: &str) -> bool {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    stripped.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Validates `s` as hex and returns it normalized.
///
/// When `even_length` is set and the stripped hex has an odd number of
/// digits, a single `0` nibble is left-padded before normalizing so the
/// result decodes cleanly to bytes. `add_prefix` controls whether the
/// returned string carries `0x`.
pub fn ensure_hex(
    s: &str,
    name: Option<&str>,
    add_prefix: bool,
    even_length: bool,
) -> Result<String, Error> {
    if !is_hex(s) {
        return Err(Error::InvalidHex {
            value: name.map(|n| format!("{n}: {s}")).unwrap_or_else(|| s.to_string()),
        });
    }
    let mut stripped = s.strip_prefix("0x").unwrap_or(s).to_string();
    if even_length && stripped.len() % 2 == 1 {
        stripped.insert(0, '0');
    }
    Ok(if add_prefix {
        format!("0x{stripped}")
    } else {
        stripped
    })
}

/// Decodes a hex string (with or without `0x`) into bytes, left-padding
/// a single zero nibble first if the digit count is odd.
pub fn bytes_from_hex(s: &str) -> Result<Vec<u8>, Error> {
    let normalized = ensure_hex(s, None, false, true)?;
    hex::decode(&normalized).map_err(|_| Error::InvalidHex { value: s.to_string() })
}

/// Encodes bytes as lowercase hex, optionally `0x`-prefixed.
pub fn hex_from_bytes(bytes: &[u8], add_prefix: bool) -> String {
    if add_prefix {
        format!("0x{}", hex::encode(bytes))
    } else {
        hex::encode(bytes)
    }
}

/// Canonical minimal big-endian encoding: no leading zero bytes, and
/// zero itself encodes as the empty byte string.
pub fn bytes_from_bigint(n: &BigInt) -> Vec<u8> {
    if n.is_zero() {
        return Vec::new();
    }
    let (_, bytes) = n.to_bytes_be();
    bytes
}

/// Minimal big-endian encoding of a non-negative `i128`. Convenience
/// wrapper over [`bytes_from_bigint`] for call sites that only deal in
/// machine integers (gas limits, nonces, chain ids).
pub fn bytes_from_int(n: u64) -> Vec<u8> {
    bytes_from_bigint(&BigInt::from(n))
}

/// Encodes a non-negative value as a JSON-RPC hex quantity: `"0x0"` for
/// zero, never the bare `"0x"` that hex-encoding
/// [`bytes_from_bigint`]'s empty-string zero encoding would produce —
/// RLP and JSON-RPC disagree on how to spell zero.
pub fn hex_quantity_from_bigint(n: &BigInt) -> String {
    if n.is_zero() {
        return "0x0".to_string();
    }
    format!("0x{}", hex::encode(bytes_from_bigint(n)))
}

/// Platform "safe integer" ceiling, matching the `2^53 - 1` bound a
/// JSON-RPC client historically had to respect.
pub const MAX_SAFE_INT: u64 = (1u64 << 53) - 1;

/// Parses a hex string as an unsigned integer, rejecting values beyond
/// [`MAX_SAFE_INT`].
pub fn int_from_hex(s: &str) -> Result<u64, Error> {
    let bytes = bytes_from_hex(s)?;
    if bytes.len() > 8 {
        return Err(Error::Overflow {
            context: format!("{s} exceeds 64 bits"),
        });
    }
    let mut buf = [0u8; 8];
    buf[8 - bytes.len()..].copy_from_slice(&bytes);
    let value = u64::from_be_bytes(buf);
    if value > MAX_SAFE_INT {
        return Err(Error::Overflow {
            context: format!("{s} exceeds the safe-integer bound"),
        });
    }
    Ok(value)
}

/// Renders a non-negative integer as a decimal string with `places`
/// fractional digits, stripping trailing fractional zeros (and the
/// point itself, if nothing remains).
pub fn decimal_string_from_bigint(n: &BigInt, places: u32) -> Result<String, Error> {
    if n.sign() == Sign::Minus {
        return Err(Error::InvalidDecimal {
            value: n.to_string(),
        });
    }
    if n.is_zero() {
        return Ok("0".to_string());
    }

    let digits = n.to_str_radix(10);
    let places = places as usize;
    let padded = if digits.len() <= places {
        format!("{:0>width$}", digits, width = places + 1)
    } else {
        digits
    };

    if places == 0 {
        return Ok(padded);
    }

    let split_at = padded.len() - places;
    let whole = &padded[..split_at];
    let frac = padded[split_at..].trim_end_matches('0');

    Ok(if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    })
}

/// Parses a decimal string with exactly `places` fractional digits of
/// precision into an integer, truncating or zero-padding the supplied
/// fractional part to fit.
pub fn bigint_from_decimal_string(s: &str, places: u32) -> Result<BigInt, Error> {
    if s.starts_with('-') {
        return Err(Error::InvalidDecimal { value: s.into() });
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || b == b'.') || s.matches('.').count() > 1 {
        return Err(Error::InvalidDecimal { value: s.into() });
    }

    let places = places as usize;
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    let whole = if whole.is_empty() { "0" } else { whole };

    let mut frac = frac.to_string();
    if frac.len() < places {
        frac.push_str(&"0".repeat(places - frac.len()));
    } else {
        frac.truncate(places);
    }

    let combined = format!("{whole}{frac}");
    combined
        .parse::<BigInt>()
        .map_err(|_| Error::InvalidDecimal { value: s.into() })
}

/// `eth_getBlockByNumber`-style block height parameter: numbers become
/// unprefixed-padding hex, the sentinels `"latest"`/`"pending"` pass
/// through untouched.
pub fn block_height_string(height: &str) -> String {
    match height {
        "latest" | "pending" => height.to_string(),
        _ => match height.parse::<u64>() {
            Ok(n) => format!("0x{n:x}"),
            Err(_) => height.to_string(),
        },
    }
}

/// Converts a millisecond timestamp to UNIX seconds, truncating towards
/// zero.
pub fn unix_time_from_timestamp(millis: u64) -> u64 {
    millis / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_hex_accepts_empty_and_prefixed() {
        assert!(is_hex(""));
        assert!(is_hex("0x"));
        assert!(is_hex("0xDEAD"));
        assert!(is_hex("dead"));
        assert!(!is_hex("0xzz"));
    }

    #[test]
    fn ensure_hex_pads_odd_length() {
        let padded = ensure_hex("0x1", None, true, true).unwrap();
        assert_eq!(padded, "0x01");
    }

    #[test]
    fn hex_bytes_round_trip() {
        let bytes = vec![0xde, 0xad, 0xbe, 0xef];
        let hex = hex_from_bytes(&bytes, true);
        assert_eq!(bytes_from_hex(&hex).unwrap(), bytes);
    }

    #[test]
    fn bytes_from_bigint_has_no_leading_zeros() {
        assert_eq!(bytes_from_bigint(&BigInt::from(0)), Vec::<u8>::new());
        assert_eq!(bytes_from_bigint(&BigInt::from(255)), vec![0xff]);
        assert_eq!(bytes_from_bigint(&BigInt::from(256)), vec![0x01, 0x00]);
    }

    #[test]
    fn hex_quantity_from_bigint_spells_zero_as_0x0() {
        assert_eq!(hex_quantity_from_bigint(&BigInt::from(0)), "0x0");
        assert_eq!(hex_quantity_from_bigint(&BigInt::from(255)), "0xff");
        assert_eq!(hex_quantity_from_bigint(&BigInt::from(256)), "0x0100");
    }

    #[test]
    fn int_from_hex_rejects_beyond_safe_integer() {
        assert!(int_from_hex("0x1fffffffffffff").is_ok()); // 2^53 - 1
        assert!(int_from_hex("0x20000000000000").is_err()); // 2^53
    }

    #[test]
    fn decimal_round_trip_six_places() {
        let n = bigint_from_decimal_string("12.34", 6).unwrap();
        assert_eq!(n, BigInt::from(12_340_000));
        assert_eq!(decimal_string_from_bigint(&n, 6).unwrap(), "12.34");
    }

    #[test]
    fn decimal_string_strips_trailing_zero_fraction() {
        assert_eq!(
            decimal_string_from_bigint(&BigInt::from(1_000_000), 6).unwrap(),
            "1"
        );
    }

    #[test]
    fn decimal_string_rejects_negative() {
        assert!(decimal_string_from_bigint(&BigInt::from(-1), 2).is_err());
    }

    #[test]
    fn decimal_from_string_rejects_leading_minus() {
        assert!(bigint_from_decimal_string("-1.5", 2).is_err());
    }

    #[test]
    fn decimal_from_string_truncates_excess_fraction() {
        let n = bigint_from_decimal_string("1.23456", 2).unwrap();
        assert_eq!(n, BigInt::from(123));
    }

    #[test]
    fn decimal_from_empty_string_is_zero() {
        assert_eq!(bigint_from_decimal_string("", 6).unwrap(), BigInt::from(0));
    }

    #[test]
    fn block_height_formats_numbers_as_hex() {
        assert_eq!(block_height_string("255"), "0xff");
        assert_eq!(block_height_string("latest"), "latest");
        assert_eq!(block_height_string("pending"), "pending");
    }

    #[test]
    fn unix_time_floors_milliseconds() {
        assert_eq!(unix_time_from_timestamp(1_700_000_999), 1_700_000);
    }
}
