//! Hashing and hash display helpers
//!
//! Hashes are always stored in internal byte order. Only the human-readable hex form
//! (block explorers, RPC) is byte-reversed.

use crate::error::{Result, WireError};
use crate::types::Hash;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};
use sha2::{Digest, Sha256};

/// Bitcoin's double SHA256: SHA256(SHA256(data)).
///
/// Identity of block headers and transactions.
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

/// Single SHA256 hash
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Parent node of two Merkle tree nodes: SHA256d(left || right)
pub fn merkle_parent(left: &Hash, right: &Hash) -> Hash {
    let mut engine = sha256d::Hash::engine();
    engine.input(left);
    engine.input(right);
    sha256d::Hash::from_engine(engine).into_inner()
}

/// Reverse the byte order of a 32-byte hash
pub fn reverse_bytes(hash: &Hash) -> Hash {
    let mut reversed = *hash;
    reversed.reverse();
    reversed
}

/// Hash in display format (reversed hex), e.g. `000000000019d6...` for the genesis block
pub fn to_display_hex(hash: &Hash) -> String {
    hex::encode(reverse_bytes(hash))
}

/// Parse a display-format (reversed hex) hash back into internal byte order
pub fn from_display_hex(display: &str) -> Result<Hash> {
    let bytes = hex::decode(display).map_err(|e| WireError::InvalidHex(e.to_string()))?;
    let mut hash = hash_from_slice("hash", &bytes)?;
    hash.reverse();
    Ok(hash)
}

/// Build a fixed 32-byte hash from a slice, failing on any other length
pub fn hash_from_slice(field: &'static str, bytes: &[u8]) -> Result<Hash> {
    <Hash>::try_from(bytes).map_err(|_| WireError::InvalidFieldLength {
        field,
        expected: 32,
        actual: bytes.len(),
    })
}
