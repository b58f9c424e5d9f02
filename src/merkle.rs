//! Merkle roots, BIP 37 partial Merkle trees and the merkleblock message
//!
//! A partial tree is a depth-first traversal of the full tree over a block's txids.
//! One flag bit is emitted per visited node (1 = this node is, or is above, a matched
//! leaf), and one hash per node where the traversal stops (pruned subtrees and matched
//! leaves). Flag bits are packed LSB-first within each byte.

use crate::codec::{Decodable, Encodable};
use crate::constants::MAX_MERKLE_TX_COUNT;
use crate::error::{Result, WireError};
use crate::hash::{merkle_parent, to_display_hex};
use crate::block::Header;
use crate::stream::{ByteReader, ByteWriter};
use crate::transaction::Transaction;
use crate::types::Hash;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Merkle root over a full list of txids; an odd node at any level is paired with itself
pub fn compute_merkle_root(txids: &[Hash]) -> Hash {
    if txids.is_empty() {
        return [0u8; 32];
    }

    let mut level = txids.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| merkle_parent(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();
    }
    level[0]
}

/// Result of walking a partial Merkle tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleMatches {
    pub root: Hash,
    /// Matched txids in block order
    pub hashes: Vec<Hash>,
    /// Position of each matched txid within the block
    pub indexes: Vec<u32>,
}

/// BIP 37 partial Merkle tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMerkleTree {
    pub tx_count: u32,
    pub hashes: Vec<Hash>,
    pub flags: Vec<u8>,
}

impl PartialMerkleTree {
    /// Build a proof for the txids whose `matches` entry is true
    pub fn from_txids(txids: &[Hash], matches: &[bool]) -> Result<Self> {
        if txids.is_empty() || txids.len() != matches.len() {
            return Err(WireError::InvalidMerkleProof(format!(
                "{} txids with {} match flags",
                txids.len(),
                matches.len()
            )));
        }

        let tx_count = txids.len() as u32;
        let mut builder = TreeBuilder {
            tx_count,
            txids,
            matches,
            bits: Vec::new(),
            hashes: Vec::new(),
        };
        let height = tree_height(tx_count);
        builder.traverse(height, 0);

        let mut flags = vec![0u8; (builder.bits.len() + 7) / 8];
        for (i, bit) in builder.bits.iter().enumerate() {
            flags[i / 8] |= (*bit as u8) << (i % 8);
        }

        Ok(Self {
            tx_count,
            hashes: builder.hashes,
            flags,
        })
    }

    /// Walk the tree, returning the computed root and the matched leaves.
    ///
    /// Fails on any shape inconsistency: too many hashes, unused flag bytes or hashes,
    /// running out of bits or hashes, or identical left/right siblings (CVE-2012-2459).
    pub fn extract_matches(&self) -> Result<MerkleMatches> {
        if self.tx_count == 0 {
            return Err(WireError::InvalidMerkleProof("zero transactions".to_string()));
        }
        if self.tx_count as usize > MAX_MERKLE_TX_COUNT {
            return Err(WireError::InvalidMerkleProof(format!(
                "{} transactions exceeds the block maximum",
                self.tx_count
            )));
        }
        if self.hashes.len() > self.tx_count as usize {
            return Err(WireError::InvalidMerkleProof(format!(
                "{} hashes for {} transactions",
                self.hashes.len(),
                self.tx_count
            )));
        }
        if self.flags.len() * 8 < self.hashes.len() {
            return Err(WireError::InvalidMerkleProof(
                "fewer flag bits than hashes".to_string(),
            ));
        }

        let mut walker = TreeWalker {
            tree: self,
            bits_used: 0,
            hashes_used: 0,
            matches: MerkleMatches {
                root: [0u8; 32],
                hashes: Vec::new(),
                indexes: Vec::new(),
            },
        };
        let root = walker.traverse(tree_height(self.tx_count), 0)?;

        if (walker.bits_used + 7) / 8 != self.flags.len() {
            return Err(WireError::InvalidMerkleProof("unused flag bytes".to_string()));
        }
        if walker.hashes_used != self.hashes.len() {
            return Err(WireError::InvalidMerkleProof(format!(
                "{} of {} hashes used",
                walker.hashes_used,
                self.hashes.len()
            )));
        }

        let mut matches = walker.matches;
        matches.root = root;
        Ok(matches)
    }

    fn flag_bit(&self, index: usize) -> Option<bool> {
        self.flags
            .get(index / 8)
            .map(|byte| (byte >> (index % 8)) & 1 == 1)
    }
}

/// Number of nodes at `height` (leaves are height 0)
fn tree_width(tx_count: u32, height: u32) -> u32 {
    ((tx_count as u64 + (1u64 << height) - 1) >> height) as u32
}

fn tree_height(tx_count: u32) -> u32 {
    let mut height = 0;
    while tree_width(tx_count, height) > 1 {
        height += 1;
    }
    height
}

struct TreeBuilder<'a> {
    tx_count: u32,
    txids: &'a [Hash],
    matches: &'a [bool],
    bits: Vec<bool>,
    hashes: Vec<Hash>,
}

impl TreeBuilder<'_> {
    fn node_hash(&self, height: u32, pos: u32) -> Hash {
        if height == 0 {
            return self.txids[pos as usize];
        }
        let left = self.node_hash(height - 1, pos * 2);
        let right = if pos * 2 + 1 < tree_width(self.tx_count, height - 1) {
            self.node_hash(height - 1, pos * 2 + 1)
        } else {
            left
        };
        merkle_parent(&left, &right)
    }

    fn traverse(&mut self, height: u32, pos: u32) {
        let start = (pos as usize) << height;
        let end = ((pos as usize + 1) << height).min(self.tx_count as usize);
        let parent_of_match = self.matches[start..end].iter().any(|m| *m);
        self.bits.push(parent_of_match);

        if height == 0 || !parent_of_match {
            let hash = self.node_hash(height, pos);
            self.hashes.push(hash);
        } else {
            self.traverse(height - 1, pos * 2);
            if pos * 2 + 1 < tree_width(self.tx_count, height - 1) {
                self.traverse(height - 1, pos * 2 + 1);
            }
        }
    }
}

struct TreeWalker<'a> {
    tree: &'a PartialMerkleTree,
    bits_used: usize,
    hashes_used: usize,
    matches: MerkleMatches,
}

impl TreeWalker<'_> {
    fn next_hash(&mut self) -> Result<Hash> {
        let hash = *self
            .tree
            .hashes
            .get(self.hashes_used)
            .ok_or_else(|| WireError::InvalidMerkleProof("ran out of hashes".to_string()))?;
        self.hashes_used += 1;
        Ok(hash)
    }

    fn traverse(&mut self, height: u32, pos: u32) -> Result<Hash> {
        let parent_of_match = self
            .tree
            .flag_bit(self.bits_used)
            .ok_or_else(|| WireError::InvalidMerkleProof("ran out of flag bits".to_string()))?;
        self.bits_used += 1;

        if height == 0 || !parent_of_match {
            let hash = self.next_hash()?;
            if height == 0 && parent_of_match {
                self.matches.hashes.push(hash);
                self.matches.indexes.push(pos);
            }
            return Ok(hash);
        }

        let left = self.traverse(height - 1, pos * 2)?;
        let right = if pos * 2 + 1 < tree_width(self.tree.tx_count, height - 1) {
            let right = self.traverse(height - 1, pos * 2 + 1)?;
            if right == left {
                return Err(WireError::InvalidMerkleProof(
                    "identical sibling hashes".to_string(),
                ));
            }
            right
        } else {
            left
        };
        Ok(merkle_parent(&left, &right))
    }
}

/// Header plus partial Merkle proof, and the transactions the proof matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleBlock {
    pub header: Header,
    /// Total transactions in the full block
    pub tx_count: u32,
    pub hashes: Vec<Hash>,
    pub flags: Vec<u8>,
    /// Txids the proof asserts are contained in this block
    pub associated_transaction_hashes: Vec<Hash>,
    pub associated_transactions: Vec<Transaction>,
}

impl MerkleBlock {
    /// Assemble a merkle block from a header and a proof; the proof must be well formed
    pub fn new(header: Header, tree: PartialMerkleTree) -> Result<Self> {
        let matches = tree.extract_matches()?;
        Ok(Self {
            header,
            tx_count: tree.tx_count,
            hashes: tree.hashes,
            flags: tree.flags,
            associated_transaction_hashes: matches.hashes,
            associated_transactions: Vec::new(),
        })
    }

    pub fn block_hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn partial_tree(&self) -> PartialMerkleTree {
        PartialMerkleTree {
            tx_count: self.tx_count,
            hashes: self.hashes.clone(),
            flags: self.flags.clone(),
        }
    }

    /// Rebuild the root from the proof and compare it with the header's merkle hash
    pub fn verify_merkle_root(&self) -> Result<MerkleMatches> {
        let matches = self.partial_tree().extract_matches()?;
        if matches.root != self.header.merkle_hash {
            debug!(
                block = %self.header.hash_hex(),
                computed = %to_display_hex(&matches.root),
                "merkle root mismatch"
            );
            return Err(WireError::InvalidMerkleProof(format!(
                "computed root {} does not match header",
                to_display_hex(&matches.root)
            )));
        }
        Ok(matches)
    }

    /// Attach a transaction the proof matched. Unmatched transactions are rejected;
    /// attaching an already attached transaction is a no-op.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        let tx_hash = transaction.tx_hash();
        if !self.associated_transaction_hashes.contains(&tx_hash) {
            return Err(WireError::UnmatchedMerkleTransaction(to_display_hex(&tx_hash)));
        }
        if self.associated_transactions.iter().any(|tx| tx.tx_hash() == tx_hash) {
            trace!(tx = %to_display_hex(&tx_hash), "transaction already associated");
            return Ok(());
        }
        trace!(tx = %to_display_hex(&tx_hash), "associated transaction with merkle block");
        self.associated_transactions.push(transaction);
        Ok(())
    }

    /// True once every matched txid has its transaction attached
    pub fn is_complete(&self) -> bool {
        self.associated_transaction_hashes.iter().all(|hash| {
            self.associated_transactions
                .iter()
                .any(|tx| &tx.tx_hash() == hash)
        })
    }
}

impl Encodable for MerkleBlock {
    fn encode(&self, writer: &mut ByteWriter) {
        self.header.encode(writer);
        writer.write_u32(self.tx_count);
        writer.write_varint(self.hashes.len() as u64);
        for hash in &self.hashes {
            writer.write(hash);
        }
        writer.write_var_bytes(&self.flags);
    }
}

impl Decodable for MerkleBlock {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let header = Header::decode(reader)?;
        let tx_count = reader.read_u32()?;

        let limit = reader.limits().max_merkle_hashes;
        let hash_count = reader.read_count("merkle hash", limit, 32)?;
        let mut hashes = Vec::with_capacity(hash_count);
        for _ in 0..hash_count {
            hashes.push(reader.read_hash()?);
        }
        let flags = reader.read_var_bytes()?;

        let tree = PartialMerkleTree {
            tx_count,
            hashes,
            flags,
        };
        MerkleBlock::new(header, tree).map_err(|e| {
            debug!(error = %e, "merkle proof failed to extract");
            e
        })
    }
}
