//! Malformed and truncated input handling

use btc_wire::codec::deserialize_partial;
use btc_wire::varint::decode_varint;
use btc_wire::*;

#[test]
fn test_empty_buffer_for_every_type() {
    let codec = WireCodec::new();
    assert!(matches!(codec.decode_transaction(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_header(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_merkle_block(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_out_point(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_tx_in(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_tx_out(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_network_address(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_inv_vect(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_inv(&[]), Err(WireError::BufferUnderrun { .. })));
    assert!(matches!(codec.decode_addr(&[]), Err(WireError::BufferUnderrun { .. })));
}

#[test]
fn test_short_header_reports_needed_bytes() {
    let result = WireCodec::new().decode_header(&[0u8; 79]);
    assert_eq!(
        result,
        Err(WireError::BufferUnderrun {
            needed: 80,
            remaining: 79
        })
    );
}

#[test]
fn test_truncated_varint_payload() {
    assert!(matches!(decode_varint(&[0xfd, 0x01]), Err(WireError::MalformedVarInt(_))));
    assert!(matches!(decode_varint(&[0xfe, 0, 0, 1]), Err(WireError::MalformedVarInt(_))));
    assert!(matches!(decode_varint(&[0xff; 8]), Err(WireError::MalformedVarInt(_))));
}

#[test]
fn test_non_canonical_varint_is_rejected() {
    assert!(matches!(decode_varint(&[0xfd, 0x10, 0x00]), Err(WireError::MalformedVarInt(_))));
    assert!(matches!(
        decode_varint(&[0xfe, 0xff, 0xff, 0x00, 0x00]),
        Err(WireError::MalformedVarInt(_))
    ));
}

#[test]
fn test_truncated_script_length_in_transaction() {
    // version, one input, outpoint, then a 0xfd script length cut short
    let mut bytes = vec![1, 0, 0, 0, 1];
    bytes.extend_from_slice(&[0u8; 36]);
    bytes.extend_from_slice(&[0xfd, 0x00]);
    let result = WireCodec::new().decode_transaction(&bytes);
    assert!(result.is_err());
}

#[test]
fn test_script_longer_than_buffer() {
    // TxOut claiming a 100-byte script with only 3 bytes behind it
    let mut bytes = 5i64.to_le_bytes().to_vec();
    bytes.push(100);
    bytes.extend_from_slice(&[0x51, 0x52, 0x53]);
    assert!(matches!(
        WireCodec::new().decode_tx_out(&bytes),
        Err(WireError::BufferUnderrun { needed: 100, remaining: 3 })
    ));
}

#[test]
fn test_trailing_bytes_rejected_but_partial_accepts() {
    let outpoint = OutPoint::new([3; 32], 1);
    let mut bytes = outpoint.to_bytes();
    bytes.push(0xee);

    assert_eq!(
        WireCodec::new().decode_out_point(&bytes),
        Err(WireError::TrailingBytes(1))
    );
    let (decoded, used) = deserialize_partial::<OutPoint>(&bytes).unwrap();
    assert_eq!(decoded, outpoint);
    assert_eq!(used, 36);
}

#[test]
fn test_hostile_output_count() {
    let codec = WireCodec::with_limits(CodecLimits {
        max_tx_outputs: 10,
        ..CodecLimits::default()
    });
    // version, zero inputs, 11 outputs claimed
    let bytes = [1, 0, 0, 0, 0, 11];
    assert!(matches!(
        codec.decode_transaction(&bytes),
        Err(WireError::CountTooLarge { count: 11, limit: 10, .. })
    ));
}

#[test]
fn test_oversized_script_limit() {
    let codec = WireCodec::with_limits(CodecLimits {
        max_var_bytes: 4,
        ..CodecLimits::default()
    });
    let output = TxOut::new(1, vec![0x51; 5]);
    assert!(matches!(
        codec.decode_tx_out(&output.to_bytes()),
        Err(WireError::CountTooLarge { count: 5, limit: 4, .. })
    ));
    assert!(WireCodec::new().decode_tx_out(&output.to_bytes()).is_ok());
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = WireError::BufferUnderrun {
        needed: 4,
        remaining: 1,
    };
    assert_eq!(err.to_string(), "Buffer underrun: needed 4 bytes, 1 remaining");

    let err = WireError::InvalidFieldLength {
        field: "outpoint hash",
        expected: 32,
        actual: 20,
    };
    assert!(err.to_string().contains("outpoint hash"));
}
