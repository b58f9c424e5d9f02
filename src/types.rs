//! Core value types shared by every wire structure

/// Hash type: 256-bit hash, stored in internal (wire) byte order
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// The all-zero hash referenced by coinbase inputs
pub const ZERO_HASH: Hash = [0u8; 32];
