//! Bitcoin VarInt (compact size) encoding
//!
//! Encoding rules:
//! - value < 0xfd: single byte
//! - value <= 0xffff: 0xfd prefix + 2 bytes (little-endian)
//! - value <= 0xffffffff: 0xfe prefix + 4 bytes (little-endian)
//! - otherwise: 0xff prefix + 8 bytes (little-endian)
//!
//! Decoding rejects over-long encodings the same way Bitcoin Core's `ReadCompactSize` does.

use crate::constants::{VARINT_U16_PREFIX, VARINT_U32_PREFIX, VARINT_U64_PREFIX};
use crate::error::{Result, WireError};

/// Number of bytes `encode_varint(value)` produces
pub fn varint_size(value: u64) -> usize {
    if value < 0xfd {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffffffff {
        5
    } else {
        9
    }
}

/// Encode a u64 value as a Bitcoin VarInt
///
/// ```
/// use btc_wire::varint::encode_varint;
///
/// assert_eq!(encode_varint(252), vec![252]);
/// assert_eq!(encode_varint(253), vec![0xfd, 253, 0]);
/// assert_eq!(encode_varint(65536), vec![0xfe, 0, 0, 1, 0]);
/// ```
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut result = Vec::with_capacity(varint_size(value));
    if value < 0xfd {
        result.push(value as u8);
    } else if value <= 0xffff {
        result.push(VARINT_U16_PREFIX);
        result.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffffffff {
        result.push(VARINT_U32_PREFIX);
        result.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        result.push(VARINT_U64_PREFIX);
        result.extend_from_slice(&value.to_le_bytes());
    }
    result
}

/// Decode a Bitcoin VarInt from the front of `data`
///
/// Returns the decoded value and the number of bytes consumed. An empty slice is a
/// `BufferUnderrun`; a prefix whose payload is cut short, or a value that should have
/// used a shorter encoding, is a `MalformedVarInt`.
///
/// ```
/// use btc_wire::varint::decode_varint;
///
/// assert_eq!(decode_varint(&[0xfd, 253, 0]).unwrap(), (253, 3));
/// assert!(decode_varint(&[0xfe, 0, 0]).is_err());
/// ```
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data.first().ok_or(WireError::BufferUnderrun {
        needed: 1,
        remaining: 0,
    })?;

    let (width, min) = match first {
        b if b < VARINT_U16_PREFIX => return Ok((b as u64, 1)),
        VARINT_U16_PREFIX => (2, 0xfd),
        VARINT_U32_PREFIX => (4, 0x1_0000),
        _ => (8, 0x1_0000_0000),
    };

    let payload = data.get(1..1 + width).ok_or_else(|| {
        WireError::MalformedVarInt(format!(
            "prefix {:#04x} needs {} bytes, {} available",
            first,
            width,
            data.len() - 1
        ))
    })?;

    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(payload);
    let value = u64::from_le_bytes(buf);

    if value < min {
        return Err(WireError::MalformedVarInt(format!(
            "non-canonical encoding of {} with prefix {:#04x}",
            value, first
        )));
    }

    Ok((value, 1 + width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_select_prefix_and_width() {
        let cases: [(u64, &[u8]); 7] = [
            (0, &[0x00]),
            (0xfc, &[0xfc]),
            (0xfd, &[0xfd, 0xfd, 0x00]),
            (0xffff, &[0xfd, 0xff, 0xff]),
            (0x10000, &[0xfe, 0x00, 0x00, 0x01, 0x00]),
            (0xffffffff, &[0xfe, 0xff, 0xff, 0xff, 0xff]),
            (0x100000000, &[0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]),
        ];

        for (value, expected) in cases {
            let encoded = encode_varint(value);
            assert_eq!(encoded, expected, "encoding of {value:#x}");
            assert_eq!(varint_size(value), expected.len());
            assert_eq!(decode_varint(&encoded).unwrap(), (value, expected.len()));
        }
    }

    #[test]
    fn test_decode_empty_is_underrun() {
        assert!(matches!(
            decode_varint(&[]),
            Err(WireError::BufferUnderrun { needed: 1, remaining: 0 })
        ));
    }

    #[test]
    fn test_decode_truncated_payload() {
        assert!(matches!(decode_varint(&[0xfd]), Err(WireError::MalformedVarInt(_))));
        assert!(matches!(decode_varint(&[0xfd, 0x00]), Err(WireError::MalformedVarInt(_))));
        assert!(matches!(decode_varint(&[0xfe, 0, 0, 0]), Err(WireError::MalformedVarInt(_))));
        assert!(matches!(
            decode_varint(&[0xff, 0, 0, 0, 0, 0, 0, 0]),
            Err(WireError::MalformedVarInt(_))
        ));
    }

    #[test]
    fn test_decode_non_canonical() {
        assert!(matches!(decode_varint(&[0xfd, 0xfc, 0x00]), Err(WireError::MalformedVarInt(_))));
        assert!(matches!(
            decode_varint(&[0xfe, 0xff, 0xff, 0x00, 0x00]),
            Err(WireError::MalformedVarInt(_))
        ));
        assert!(matches!(
            decode_varint(&[0xff, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]),
            Err(WireError::MalformedVarInt(_))
        ));
    }

    #[test]
    fn test_decode_ignores_following_bytes() {
        assert_eq!(decode_varint(&[0x05, 0xaa, 0xbb]).unwrap(), (5, 1));
        assert_eq!(decode_varint(&[0xfd, 0x00, 0x01, 0xaa]).unwrap(), (256, 3));
    }
}
