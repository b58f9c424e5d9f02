//! # btc-wire
//!
//! Bitcoin peer-to-peer wire-format codec and block/transaction object model.
//!
//! This crate turns raw P2P message payloads into typed values and back: transactions,
//! block headers, BIP 37 merkle blocks, peer addresses and inventory vectors. Object
//! identity is the double SHA256 of the canonical serialization, recomputed on demand.
//!
//! ## Architecture
//!
//! - `stream` / `varint`: byte cursor, writer and compact-size integers
//! - `codec`: `Encodable` / `Decodable` traits and the strict decode entry points
//! - `transaction`, `block`, `merkle`, `network`: the wire structures
//! - `BlockStore`: arena of blocks and transactions related by hash
//!
//! ## Design Principles
//!
//! 1. **All-or-nothing decoding**: a failed decode never yields a partial object
//! 2. **Bounded allocation**: every wire count is checked against `CodecLimits` and the
//!    remaining input before allocating
//! 3. **Exact Version Pinning**: hashing dependencies are pinned to exact versions
//!
//! ## Usage
//!
//! ```rust
//! use btc_wire::WireCodec;
//! use btc_wire::transaction::{OutPoint, Transaction, TxIn, TxOut};
//!
//! let codec = WireCodec::new();
//! let tx = Transaction::new(
//!     1,
//!     vec![TxIn::new(OutPoint::null(), vec![0x51], 0xffffffff)],
//!     vec![TxOut::new(5_000_000_000, vec![0x51])],
//!     0,
//! );
//! let bytes = codec.encode(&tx);
//! let decoded = codec.decode_transaction(&bytes).unwrap();
//! assert_eq!(decoded.tx_hash(), tx.tx_hash());
//! ```

pub mod types;
pub mod constants;
pub mod config;
pub mod error;
pub mod varint;
pub mod stream;
pub mod hash;
pub mod codec;
pub mod transaction;
pub mod block;
pub mod merkle;
pub mod network;

// Re-export commonly used types
pub use types::*;
pub use config::CodecLimits;
pub use error::{Result, WireError};
pub use codec::{Decodable, Encodable};
pub use stream::{ByteReader, ByteWriter};
pub use transaction::{OutPoint, Transaction, TxIn, TxOut};
pub use block::{Block, BlockStore, Header};
pub use merkle::{MerkleBlock, PartialMerkleTree};
pub use network::{Addr, GetData, Inv, InvType, InvVect, NetworkAddress, NetworkAddressTimestamp};

use tracing::debug;

/// Entry point bundling decoder limits with typed decode/encode operations
///
/// # Examples
///
/// ```
/// use btc_wire::{CodecLimits, WireCodec};
///
/// let limits = CodecLimits { max_inv_items: 10, ..CodecLimits::default() };
/// let codec = WireCodec::with_limits(limits);
/// assert_eq!(codec.limits().max_inv_items, 10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec {
    limits: CodecLimits,
}

impl WireCodec {
    /// Create a codec with the protocol default limits
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_wire::WireCodec;
    ///
    /// let codec = WireCodec::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: CodecLimits) -> Self {
        Self { limits }
    }

    /// Load limits from a JSON document; missing fields take their defaults
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_wire::WireCodec;
    ///
    /// let codec = WireCodec::from_json_config(r#"{ "max_addr_entries": 10 }"#).unwrap();
    /// assert_eq!(codec.limits().max_addr_entries, 10);
    /// assert_eq!(codec.limits().max_inv_items, 50_000);
    /// ```
    pub fn from_json_config(json: &str) -> Result<Self> {
        let limits = CodecLimits::from_json(json)?;
        debug!(?limits, "loaded codec limits");
        Ok(Self::with_limits(limits))
    }

    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    /// Decode any wire type that must span the whole buffer
    pub fn decode<T: Decodable>(&self, data: &[u8]) -> Result<T> {
        codec::deserialize_with_limits(data, self.limits)
    }

    /// Decode a value from the front of the buffer, returning it and the bytes consumed
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_wire::{OutPoint, WireCodec};
    ///
    /// let codec = WireCodec::new();
    /// let mut bytes = codec.encode(&OutPoint::new([7; 32], 1));
    /// bytes.extend_from_slice(&[0xde, 0xad]);
    /// let (outpoint, used): (OutPoint, usize) = codec.decode_partial(&bytes).unwrap();
    /// assert_eq!(outpoint.index, 1);
    /// assert_eq!(used, 36);
    /// ```
    pub fn decode_partial<T: Decodable>(&self, data: &[u8]) -> Result<(T, usize)> {
        codec::deserialize_partial_with_limits(data, self.limits)
    }

    /// Decode a transaction
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_wire::{WireCodec, WireError};
    ///
    /// let codec = WireCodec::new();
    /// let result = codec.decode_transaction(&[1, 0, 0]);
    /// assert!(matches!(result, Err(WireError::BufferUnderrun { .. })));
    /// ```
    pub fn decode_transaction(&self, data: &[u8]) -> Result<Transaction> {
        self.decode(data)
    }

    /// Decode an 80-byte block header
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_wire::WireCodec;
    ///
    /// let genesis = hex::decode(
    ///     "0100000000000000000000000000000000000000000000000000000000000000\
    ///      000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa\
    ///      4b1e5e4a29ab5f49ffff001d1dac2b7c",
    /// ).unwrap();
    /// let header = WireCodec::new().decode_header(&genesis).unwrap();
    /// assert_eq!(
    ///     header.hash_hex(),
    ///     "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
    /// );
    /// ```
    pub fn decode_header(&self, data: &[u8]) -> Result<Header> {
        self.decode(data)
    }

    /// Decode a merkleblock payload, extracting the matched txids from its proof
    pub fn decode_merkle_block(&self, data: &[u8]) -> Result<MerkleBlock> {
        self.decode(data)
    }

    pub fn decode_out_point(&self, data: &[u8]) -> Result<OutPoint> {
        self.decode(data)
    }

    pub fn decode_tx_in(&self, data: &[u8]) -> Result<TxIn> {
        self.decode(data)
    }

    pub fn decode_tx_out(&self, data: &[u8]) -> Result<TxOut> {
        self.decode(data)
    }

    pub fn decode_network_address(&self, data: &[u8]) -> Result<NetworkAddress> {
        self.decode(data)
    }

    pub fn decode_network_address_timestamp(&self, data: &[u8]) -> Result<NetworkAddressTimestamp> {
        self.decode(data)
    }

    pub fn decode_inv_vect(&self, data: &[u8]) -> Result<InvVect> {
        self.decode(data)
    }

    /// Decode an inv or getdata payload
    pub fn decode_inv(&self, data: &[u8]) -> Result<Inv> {
        self.decode(data)
    }

    pub fn decode_addr(&self, data: &[u8]) -> Result<Addr> {
        self.decode(data)
    }

    /// Canonical serialization of any wire type
    pub fn encode<T: Encodable>(&self, value: &T) -> Vec<u8> {
        codec::serialize(value)
    }

    /// Double SHA256 of arbitrary bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_wire::WireCodec;
    ///
    /// let hash = WireCodec::new().double_sha256(b"hello");
    /// assert_eq!(
    ///     hex::encode(hash),
    ///     "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
    /// );
    /// ```
    pub fn double_sha256(&self, data: &[u8]) -> Hash {
        hash::double_sha256(data)
    }
}
