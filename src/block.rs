//! Block headers, chain blocks and the block/transaction store
//!
//! `Header` is the 80-byte wire header. `Block` is not a wire object: it pairs a header
//! with chain-position metadata. Relations between blocks, and between a block and its
//! transactions, live in `BlockStore` and are resolved by hash lookup, never by
//! embedded references.

use crate::codec::{Decodable, Encodable};
use crate::constants::HEADER_SIZE;
use crate::error::{Result, WireError};
use crate::hash::{double_sha256, to_display_hex};
use crate::merkle::MerkleBlock;
use crate::stream::{ByteReader, ByteWriter};
use crate::transaction::Transaction;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{trace, warn};

/// Block header: version | prev hash | merkle hash | timestamp | bits | nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: i32,
    pub prev_hash: Hash,
    pub merkle_hash: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl Header {
    /// Serialize to exactly 80 bytes
    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&self.version.to_le_bytes());
        header[4..36].copy_from_slice(&self.prev_hash);
        header[36..68].copy_from_slice(&self.merkle_hash);
        header[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        header[72..76].copy_from_slice(&self.bits.to_le_bytes());
        header[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        header
    }

    /// Block hash: SHA256d of the serialized header, recomputed on each call
    pub fn hash(&self) -> Hash {
        double_sha256(&self.serialize())
    }

    pub fn hash_hex(&self) -> String {
        to_display_hex(&self.hash())
    }
}

impl Encodable for Header {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write(&self.serialize());
    }

    fn encoded_len(&self) -> usize {
        HEADER_SIZE
    }
}

impl Decodable for Header {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        // Check the full width up front so a short header never half-decodes
        if reader.remaining() < HEADER_SIZE {
            return Err(WireError::BufferUnderrun {
                needed: HEADER_SIZE,
                remaining: reader.remaining(),
            });
        }
        Ok(Self {
            version: reader.read_i32()?,
            prev_hash: reader.read_hash()?,
            merkle_hash: reader.read_hash()?,
            timestamp: reader.read_u32()?,
            bits: reader.read_u32()?,
            nonce: reader.read_u32()?,
        })
    }
}

/// A block's position in the chain. Its predecessor and transactions are store lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub synced: bool,
    pub height: u32,
    pub header: Header,
}

impl Block {
    pub fn new(header: Header, height: u32) -> Self {
        Self {
            synced: false,
            height,
            header,
        }
    }

    pub fn from_merkle_block(merkle_block: &MerkleBlock, height: u32) -> Self {
        Self::new(merkle_block.header, height)
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Key of the predecessor in a `BlockStore`
    pub fn prev_hash(&self) -> &Hash {
        &self.header.prev_hash
    }
}

#[derive(Debug, Clone)]
struct StoredTransaction {
    transaction: Transaction,
    block_hash: Option<Hash>,
}

/// Append-friendly store of blocks and transactions keyed by hash.
///
/// Callers that share a store across threads wrap it in their own lock.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: HashMap<Hash, Block>,
    transactions: HashMap<Hash, StoredTransaction>,
    block_transactions: HashMap<Hash, Vec<Hash>>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Insert a block, returning its hash.
    ///
    /// Heights must step by exactly one along stored links in both directions: a stored
    /// predecessor must sit one below, and any stored children one above. Re-inserting a
    /// stored block keeps the existing entry, including its sync state.
    pub fn insert_block(&mut self, block: Block) -> Result<Hash> {
        let hash = block.hash();

        if let Some(existing) = self.blocks.get(&hash) {
            if existing.height != block.height {
                return Err(reject_height(&block, existing.height, block.height));
            }
            trace!(block = %to_display_hex(&hash), "block already stored");
            return Ok(hash);
        }

        if let Some(previous) = self.blocks.get(block.prev_hash()) {
            match previous.height.checked_add(1) {
                Some(expected) if expected == block.height => {}
                Some(expected) => return Err(reject_height(&block, expected, block.height)),
                None => return Err(reject_height(&block, u32::MAX, block.height)),
            }
        }

        for child in self.blocks.values().filter(|b| b.prev_hash() == &hash) {
            match block.height.checked_add(1) {
                Some(expected) if expected == child.height => {}
                Some(expected) => return Err(reject_height(&block, expected, child.height)),
                None => return Err(reject_height(&block, u32::MAX, child.height)),
            }
        }

        trace!(block = %to_display_hex(&hash), height = block.height, "storing block");
        self.blocks.insert(hash, block);
        Ok(hash)
    }

    /// Insert a transaction, optionally linked to a stored block, returning its hash
    pub fn insert_transaction(
        &mut self,
        transaction: Transaction,
        block_hash: Option<Hash>,
    ) -> Result<Hash> {
        if let Some(block_hash) = &block_hash {
            if !self.blocks.contains_key(block_hash) {
                return Err(WireError::UnknownBlock(to_display_hex(block_hash)));
            }
        }

        let tx_hash = transaction.tx_hash();
        trace!(tx = %to_display_hex(&tx_hash), "storing transaction");

        if let Some(old) = self.transactions.get(&tx_hash) {
            if let Some(old_block) = old.block_hash {
                if let Some(list) = self.block_transactions.get_mut(&old_block) {
                    list.retain(|h| h != &tx_hash);
                }
            }
        }
        if let Some(block_hash) = block_hash {
            self.block_transactions.entry(block_hash).or_default().push(tx_hash);
        }
        self.transactions.insert(
            tx_hash,
            StoredTransaction {
                transaction,
                block_hash,
            },
        );
        Ok(tx_hash)
    }

    /// Store a merkle block as a chain block together with its associated transactions
    pub fn insert_merkle_block(&mut self, merkle_block: MerkleBlock, height: u32) -> Result<Hash> {
        let block_hash = self.insert_block(Block::from_merkle_block(&merkle_block, height))?;
        for transaction in merkle_block.associated_transactions {
            self.insert_transaction(transaction, Some(block_hash))?;
        }
        Ok(block_hash)
    }

    pub fn block(&self, hash: &Hash) -> Option<&Block> {
        self.blocks.get(hash)
    }

    pub fn transaction(&self, hash: &Hash) -> Option<&Transaction> {
        self.transactions.get(hash).map(|stored| &stored.transaction)
    }

    /// The stored predecessor of `block`, looked up by its prev hash
    pub fn previous_block(&self, block: &Block) -> Option<&Block> {
        self.blocks.get(block.prev_hash())
    }

    /// Transactions linked to the block, in insertion order
    pub fn transactions_of(&self, block_hash: &Hash) -> Vec<&Transaction> {
        self.block_transactions
            .get(block_hash)
            .map(|hashes| hashes.iter().filter_map(|h| self.transaction(h)).collect())
            .unwrap_or_default()
    }

    pub fn block_of_transaction(&self, tx_hash: &Hash) -> Option<&Block> {
        self.transactions
            .get(tx_hash)
            .and_then(|stored| stored.block_hash.as_ref())
            .and_then(|block_hash| self.blocks.get(block_hash))
    }

    /// Highest stored block
    pub fn tip(&self) -> Option<&Block> {
        self.blocks.values().max_by_key(|block| block.height)
    }

    pub fn mark_synced(&mut self, hash: &Hash) -> Result<()> {
        let block = self
            .blocks
            .get_mut(hash)
            .ok_or_else(|| WireError::UnknownBlock(to_display_hex(hash)))?;
        block.synced = true;
        Ok(())
    }
}

/// Height arithmetic that would overflow reports `u32::MAX` as the expected height
fn reject_height(block: &Block, expected: u32, actual: u32) -> WireError {
    warn!(
        block = %block.header.hash_hex(),
        height = block.height,
        expected,
        actual,
        "rejecting block with broken height chain"
    );
    WireError::InvalidBlockHeight { expected, actual }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::deserialize;

    const GENESIS_HEADER_HEX: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c";

    fn header_with_prev(prev_hash: Hash, nonce: u32) -> Header {
        Header {
            version: 1,
            prev_hash,
            merkle_hash: [0x34; 32],
            timestamp: 1231006505,
            bits: 0x1d00ffff,
            nonce,
        }
    }

    #[test]
    fn test_genesis_header_hash() {
        let bytes = hex::decode(GENESIS_HEADER_HEX).unwrap();
        let header: Header = deserialize(&bytes).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.prev_hash, ZERO_HASH);
        assert_eq!(header.timestamp, 1231006505);
        assert_eq!(header.bits, 0x1d00ffff);
        assert_eq!(header.nonce, 2083236893);
        assert_eq!(
            header.hash_hex(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(header.serialize().to_vec(), bytes);
    }

    #[test]
    fn test_header_serialization_layout() {
        let header = Header {
            version: 0x20000000,
            prev_hash: [0x12; 32],
            merkle_hash: [0x34; 32],
            timestamp: 1700000000,
            bits: 0x17034219,
            nonce: 0xDEADBEEF,
        };
        let serialized = header.serialize();
        assert_eq!(&serialized[0..4], &[0x00, 0x00, 0x00, 0x20]);
        assert_eq!(&serialized[4..36], &[0x12; 32]);
        assert_eq!(&serialized[36..68], &[0x34; 32]);
        assert_eq!(&serialized[76..80], &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(header.to_bytes().len(), HEADER_SIZE);
    }

    #[test]
    fn test_short_header_is_underrun() {
        let bytes = hex::decode(GENESIS_HEADER_HEX).unwrap();
        assert_eq!(
            deserialize::<Header>(&bytes[..79]),
            Err(WireError::BufferUnderrun { needed: 80, remaining: 79 })
        );
    }

    #[test]
    fn test_block_hash_delegates_to_header() {
        let header = header_with_prev(ZERO_HASH, 7);
        let block = Block::new(header, 0);
        assert_eq!(block.hash(), header.hash());
        assert!(!block.synced);
    }

    #[test]
    fn test_store_links_previous_block() {
        let mut store = BlockStore::new();
        let genesis = Block::new(header_with_prev(ZERO_HASH, 1), 0);
        let genesis_hash = store.insert_block(genesis.clone()).unwrap();

        let child = Block::new(header_with_prev(genesis_hash, 2), 1);
        store.insert_block(child.clone()).unwrap();

        assert_eq!(store.previous_block(&child), Some(&genesis));
        assert_eq!(store.previous_block(&genesis), None);
        assert_eq!(store.tip().map(|b| b.height), Some(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_rejects_broken_height() {
        let mut store = BlockStore::new();
        let genesis_hash = store
            .insert_block(Block::new(header_with_prev(ZERO_HASH, 1), 10))
            .unwrap();

        let result = store.insert_block(Block::new(header_with_prev(genesis_hash, 2), 12));
        assert_eq!(
            result,
            Err(WireError::InvalidBlockHeight { expected: 11, actual: 12 })
        );
    }

    #[test]
    fn test_store_rejects_parent_above_stored_child() {
        let mut store = BlockStore::new();
        let parent = Block::new(header_with_prev(ZERO_HASH, 1), 10);
        let child = Block::new(header_with_prev(parent.hash(), 2), 5);
        store.insert_block(child).unwrap();

        assert_eq!(
            store.insert_block(parent),
            Err(WireError::InvalidBlockHeight { expected: 11, actual: 5 })
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_height_overflow_is_an_error() {
        let mut store = BlockStore::new();
        let top = store
            .insert_block(Block::new(header_with_prev(ZERO_HASH, 1), u32::MAX))
            .unwrap();
        let result = store.insert_block(Block::new(header_with_prev(top, 2), 0));
        assert_eq!(
            result,
            Err(WireError::InvalidBlockHeight { expected: u32::MAX, actual: 0 })
        );
    }

    #[test]
    fn test_store_reinsert_keeps_sync_state() {
        let mut store = BlockStore::new();
        let block = Block::new(header_with_prev(ZERO_HASH, 1), 0);
        let hash = store.insert_block(block.clone()).unwrap();
        store.mark_synced(&hash).unwrap();

        assert_eq!(store.insert_block(block.clone()), Ok(hash));
        assert!(store.block(&hash).unwrap().synced);

        let mut moved = block;
        moved.height = 3;
        assert!(matches!(
            store.insert_block(moved),
            Err(WireError::InvalidBlockHeight { expected: 0, actual: 3 })
        ));
    }

    #[test]
    fn test_store_transaction_relations() {
        let mut store = BlockStore::new();
        let block_hash = store
            .insert_block(Block::new(header_with_prev(ZERO_HASH, 1), 0))
            .unwrap();

        let tx = Transaction::new(1, vec![], vec![], 0);
        let tx_hash = store.insert_transaction(tx.clone(), Some(block_hash)).unwrap();

        assert_eq!(store.transaction(&tx_hash), Some(&tx));
        assert_eq!(store.transactions_of(&block_hash), vec![&tx]);
        assert_eq!(store.block_of_transaction(&tx_hash).map(Block::hash), Some(block_hash));
        assert!(store.transactions_of(&[9; 32]).is_empty());
    }

    #[test]
    fn test_store_transaction_unknown_block() {
        let mut store = BlockStore::new();
        let tx = Transaction::new(1, vec![], vec![], 0);
        assert!(matches!(
            store.insert_transaction(tx, Some([5; 32])),
            Err(WireError::UnknownBlock(_))
        ));
        assert_eq!(store.transaction_count(), 0);
    }

    #[test]
    fn test_mark_synced() {
        let mut store = BlockStore::new();
        let hash = store
            .insert_block(Block::new(header_with_prev(ZERO_HASH, 1), 0))
            .unwrap();
        store.mark_synced(&hash).unwrap();
        assert!(store.block(&hash).unwrap().synced);
        assert!(store.mark_synced(&[1; 32]).is_err());
    }
}
