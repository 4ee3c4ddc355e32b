//! Field-level conversions shared by every mapping.

use alloy::primitives::{U256, hex};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::MapError;
use crate::model::{HASH_LEN, SIGNATURE_LEN};

/// Decode bare hex; the proxy never emits a `0x` prefix.
fn bare_hex(value: &str) -> Result<Vec<u8>, String> {
    if value.starts_with("0x") || value.starts_with("0X") {
        return Err("unexpected 0x prefix".to_owned());
    }
    hex::decode(value).map_err(|e| e.to_string())
}

/// Decode a mandatory 32-byte hex hash.
pub(crate) fn hash(field: &'static str, value: &str) -> Result<Vec<u8>, MapError> {
    let bytes = bare_hex(value).map_err(|reason| MapError::InvalidHash { field, reason })?;
    if bytes.len() != HASH_LEN {
        return Err(MapError::InvalidHash {
            field,
            reason: format!("expected {HASH_LEN} bytes, got {}", bytes.len()),
        });
    }
    Ok(bytes)
}

/// Decode a hash that the proxy may leave empty; empty maps to empty bytes.
pub(crate) fn optional_hash(field: &'static str, value: &str) -> Result<Vec<u8>, MapError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    hash(field, value)
}

/// Decode a hex signature; an empty signature is absent.
pub(crate) fn signature(value: &str) -> Result<Option<Vec<u8>>, MapError> {
    if value.is_empty() {
        return Ok(None);
    }
    let bytes = bare_hex(value).map_err(|reason| MapError::InvalidField {
        field: "signature",
        reason,
    })?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(MapError::InvalidField {
            field: "signature",
            reason: format!("expected {SIGNATURE_LEN} bytes, got {}", bytes.len()),
        });
    }
    Ok(Some(bytes))
}

/// Parse a decimal big-integer string into minimal big-endian bytes.
///
/// Zero, and the empty string the proxy emits for unset amounts, both map to
/// the empty byte sequence. Values above `2^256 - 1` are rejected as
/// [`MapError::InvalidAmount`]; no on-chain amount reaches that ceiling.
pub(crate) fn amount(field: &'static str, value: &str) -> Result<Vec<u8>, MapError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MapError::InvalidAmount {
            field,
            value: value.to_owned(),
        });
    }
    let parsed = U256::from_str_radix(value, 10).map_err(|_| MapError::InvalidAmount {
        field,
        value: value.to_owned(),
    })?;
    Ok(parsed
        .to_be_bytes::<32>()
        .into_iter()
        .skip_while(|b| *b == 0)
        .collect())
}

/// Bech32 addresses are carried as their ASCII bytes.
pub(crate) fn address(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Like [`address`], but an empty source address is absent.
pub(crate) fn optional_address(value: &str) -> Option<Vec<u8>> {
    (!value.is_empty()).then(|| address(value))
}

/// Decode an optional base64 payload; absent or empty maps to empty bytes.
pub(crate) fn base64(field: &'static str, value: Option<&str>) -> Result<Vec<u8>, MapError> {
    match value {
        None | Some("") => Ok(Vec::new()),
        Some(encoded) => STANDARD
            .decode(encoded)
            .map_err(|e| MapError::InvalidField {
                field,
                reason: e.to_string(),
            }),
    }
}

pub(crate) fn long(field: &'static str, value: u64) -> Result<i64, MapError> {
    i64::try_from(value).map_err(|_| MapError::InvalidField {
        field,
        reason: format!("{value} does not fit a signed 64-bit integer"),
    })
}

pub(crate) fn int(field: &'static str, value: u32) -> Result<i32, MapError> {
    i32::try_from(value).map_err(|_| MapError::InvalidField {
        field,
        reason: format!("{value} does not fit a signed 32-bit integer"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_is_minimal_big_endian() {
        assert_eq!(amount("fee", "0").unwrap(), Vec::<u8>::new(), "zero is empty");
        assert_eq!(amount("fee", "").unwrap(), Vec::<u8>::new(), "unset is empty");
        assert_eq!(amount("fee", "255").unwrap(), vec![0xff], "no sign byte");
        assert_eq!(amount("fee", "256").unwrap(), vec![0x01, 0x00], "two bytes");
        assert_eq!(
            amount("fee", "1000000000000000000").unwrap(),
            vec![0x0d, 0xe0, 0xb6, 0xb3, 0xa7, 0x64, 0x00, 0x00],
            "one EGLD"
        );
    }

    #[test]
    fn amount_rejects_non_decimal_input() {
        for bad in ["abc", "-5", "0x10", "1.5", " 1"] {
            let err = amount("balance", bad).unwrap_err();
            assert_eq!(
                err,
                MapError::InvalidAmount {
                    field: "balance",
                    value: bad.to_owned()
                },
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn hash_requires_exactly_32_bytes() {
        assert_eq!(hash("hash", &"ab".repeat(32)).unwrap(), vec![0xab; 32], "valid");
        assert!(
            matches!(hash("hash", "abcd"), Err(MapError::InvalidHash { field: "hash", .. })),
            "short hash must fail"
        );
        assert!(
            matches!(hash("hash", "zz"), Err(MapError::InvalidHash { .. })),
            "non-hex must fail"
        );
        assert!(hash("hash", "").is_err(), "empty mandatory hash must fail");
        assert!(
            matches!(
                hash("hash", &format!("0x{}", "ab".repeat(32))),
                Err(MapError::InvalidHash { field: "hash", .. })
            ),
            "prefixed hash must fail"
        );
        assert!(optional_hash("rootHash", "").unwrap().is_empty(), "empty optional hash");
    }

    #[test]
    fn signature_is_optional_but_sized() {
        assert_eq!(signature("").unwrap(), None, "empty signature is absent");
        assert_eq!(signature(&"01".repeat(64)).unwrap(), Some(vec![1; 64]), "valid");
        assert!(signature("0102").is_err(), "short signature must fail");
        assert!(
            signature(&format!("0x{}", "01".repeat(64))).is_err(),
            "prefixed signature must fail"
        );
    }

    #[test]
    fn amount_ceiling_is_u256_max() {
        let max = U256::MAX.to_string();
        assert_eq!(amount("value", &max).unwrap(), vec![0xff; 32], "max fits");
        let above = format!("{max}0");
        assert!(
            matches!(amount("value", &above), Err(MapError::InvalidAmount { field: "value", .. })),
            "above the ceiling"
        );
    }

    #[test]
    fn base64_payloads() {
        assert_eq!(base64("data", None).unwrap(), Vec::<u8>::new(), "absent");
        assert_eq!(base64("data", Some("aGVsbG8=")).unwrap(), b"hello".to_vec(), "decoded");
        assert!(base64("data", Some("***")).is_err(), "invalid base64");
    }
}
