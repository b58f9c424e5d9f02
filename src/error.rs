//! Error types for wire decoding and chain storage

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },

    #[error("Malformed varint: {0}")]
    MalformedVarInt(String),

    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Transaction {0} is not matched by the merkle proof")]
    UnmatchedMerkleTransaction(String),

    #[error("Unknown inventory type: {0}")]
    UnknownInventoryType(u32),

    #[error("{what} count {count} exceeds limit {limit}")]
    CountTooLarge {
        what: &'static str,
        count: u64,
        limit: usize,
    },

    #[error("Invalid merkle proof: {0}")]
    InvalidMerkleProof(String),

    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    #[error("String field is not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid block height: expected {expected}, got {actual}")]
    InvalidBlockHeight { expected: u32, actual: u32 },

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WireError>;
