//! Decoder limits
//!
//! Bounds applied while decoding untrusted peer input. Every count read from the wire
//! is checked against these limits before anything is allocated. Limits can be built
//! programmatically or loaded from JSON; omitted fields fall back to protocol defaults.

use crate::constants::*;
use crate::error::{Result, WireError};
use serde::{Deserialize, Serialize};

/// Count and size limits carried by every `ByteReader`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecLimits {
    /// Maximum entries in an inv/getdata message (Bitcoin Core: 50000)
    #[serde(default = "default_max_inv_items")]
    pub max_inv_items: usize,

    /// Maximum entries in an addr message (Bitcoin Core: 1000)
    #[serde(default = "default_max_addr_entries")]
    pub max_addr_entries: usize,

    /// Maximum inputs per transaction
    #[serde(default = "default_max_tx_entries")]
    pub max_tx_inputs: usize,

    /// Maximum outputs per transaction
    #[serde(default = "default_max_tx_entries")]
    pub max_tx_outputs: usize,

    /// Maximum hashes carried by a merkleblock proof
    #[serde(default = "default_max_merkle_hashes")]
    pub max_merkle_hashes: usize,

    /// Maximum length of any length-prefixed byte run (scripts, flags, strings)
    #[serde(default = "default_max_var_bytes")]
    pub max_var_bytes: usize,
}

fn default_max_inv_items() -> usize {
    MAX_INV_ITEMS
}

fn default_max_addr_entries() -> usize {
    MAX_ADDR_ENTRIES
}

fn default_max_tx_entries() -> usize {
    MAX_TX_ENTRIES
}

fn default_max_merkle_hashes() -> usize {
    MAX_MERKLE_TX_COUNT
}

fn default_max_var_bytes() -> usize {
    MAX_VAR_BYTES
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_inv_items: MAX_INV_ITEMS,
            max_addr_entries: MAX_ADDR_ENTRIES,
            max_tx_inputs: MAX_TX_ENTRIES,
            max_tx_outputs: MAX_TX_ENTRIES,
            max_merkle_hashes: MAX_MERKLE_TX_COUNT,
            max_var_bytes: MAX_VAR_BYTES,
        }
    }
}

impl CodecLimits {
    /// Load limits from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WireError::Config(e.to_string()))
    }

    /// Render limits as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| WireError::Config(e.to_string()))
    }
}
