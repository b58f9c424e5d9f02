//! Encode/decode traits and top-level entry points
//!
//! Every wire structure implements `Encodable` and `Decodable`. Decoders build all
//! fields into locals and only construct the value once every read succeeded, so a
//! failed decode never yields a partially populated object.

use crate::config::CodecLimits;
use crate::error::{Result, WireError};
use crate::stream::{ByteReader, ByteWriter};
use tracing::debug;

/// A value with a canonical wire encoding
pub trait Encodable {
    fn encode(&self, writer: &mut ByteWriter);

    /// Encoded size in bytes
    fn encoded_len(&self) -> usize {
        self.to_bytes().len()
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }
}

/// A value that can be read from a byte cursor
pub trait Decodable: Sized {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self>;
}

pub fn serialize<T: Encodable>(value: &T) -> Vec<u8> {
    value.to_bytes()
}

/// Decode a value that must span the whole buffer
pub fn deserialize<T: Decodable>(data: &[u8]) -> Result<T> {
    deserialize_with_limits(data, CodecLimits::default())
}

/// Decode a value that must span the whole buffer, under explicit limits
pub fn deserialize_with_limits<T: Decodable>(data: &[u8], limits: CodecLimits) -> Result<T> {
    let mut reader = ByteReader::with_limits(data, limits);
    let result = T::decode(&mut reader).and_then(|value| match reader.remaining() {
        0 => Ok(value),
        n => Err(WireError::TrailingBytes(n)),
    });
    if let Err(e) = &result {
        debug!(target_type = std::any::type_name::<T>(), error = %e, "decode failed");
    }
    result
}

/// Decode a value from the front of the buffer, returning it and the bytes consumed
pub fn deserialize_partial<T: Decodable>(data: &[u8]) -> Result<(T, usize)> {
    deserialize_partial_with_limits(data, CodecLimits::default())
}

/// Decode a value from the front of the buffer under explicit limits
pub fn deserialize_partial_with_limits<T: Decodable>(
    data: &[u8],
    limits: CodecLimits,
) -> Result<(T, usize)> {
    let mut reader = ByteReader::with_limits(data, limits);
    match T::decode(&mut reader) {
        Ok(value) => Ok((value, reader.position())),
        Err(e) => {
            debug!(target_type = std::any::type_name::<T>(), error = %e, "decode failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair(u32, u8);

    impl Encodable for Pair {
        fn encode(&self, writer: &mut ByteWriter) {
            writer.write_u32(self.0).write_u8(self.1);
        }
    }

    impl Decodable for Pair {
        fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
            Ok(Pair(reader.read_u32()?, reader.read_u8()?))
        }
    }

    #[derive(Debug, PartialEq)]
    struct Run(Vec<u8>);

    impl Decodable for Run {
        fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
            Ok(Run(reader.read_var_bytes()?))
        }
    }

    #[test]
    fn test_serialize_deserialize() {
        let bytes = serialize(&Pair(7, 9));
        assert_eq!(bytes, vec![7, 0, 0, 0, 9]);
        assert_eq!(Pair(7, 9).encoded_len(), 5);
        assert_eq!(deserialize::<Pair>(&bytes).unwrap(), Pair(7, 9));
    }

    #[test]
    fn test_deserialize_rejects_trailing_bytes() {
        let result = deserialize::<Pair>(&[7, 0, 0, 0, 9, 0xaa]);
        assert_eq!(result, Err(WireError::TrailingBytes(1)));
    }

    #[test]
    fn test_deserialize_partial_reports_consumed() {
        let (pair, used) = deserialize_partial::<Pair>(&[1, 0, 0, 0, 2, 0xaa, 0xbb]).unwrap();
        assert_eq!(pair, Pair(1, 2));
        assert_eq!(used, 5);
    }

    #[test]
    fn test_deserialize_partial_honours_limits() {
        let limits = CodecLimits {
            max_var_bytes: 2,
            ..CodecLimits::default()
        };
        let data = [3, 0xaa, 0xbb, 0xcc, 0xdd];
        assert!(matches!(
            deserialize_partial_with_limits::<Run>(&data, limits),
            Err(WireError::CountTooLarge { count: 3, limit: 2, .. })
        ));
        let (run, used) = deserialize_partial::<Run>(&data).unwrap();
        assert_eq!(run, Run(vec![0xaa, 0xbb, 0xcc]));
        assert_eq!(used, 4);
    }

    #[test]
    fn test_truncated_is_underrun() {
        assert!(matches!(
            deserialize::<Pair>(&[1, 0, 0]),
            Err(WireError::BufferUnderrun { .. })
        ));
    }
}
