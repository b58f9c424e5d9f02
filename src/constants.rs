//! Bitcoin P2P wire-format constants

/// Serialized block header size
pub const HEADER_SIZE: usize = 80;

/// Serialized outpoint size: hash (32) + index (4)
pub const OUTPOINT_SIZE: usize = 36;

/// Serialized inventory vector size: type (4) + hash (32)
pub const INV_VECT_SIZE: usize = 36;

/// Serialized network address without timestamp: services (8) + address (16) + port (2)
pub const NETWORK_ADDRESS_SIZE: usize = 26;

/// Serialized network address with its leading timestamp
pub const NETWORK_ADDRESS_TIMESTAMP_SIZE: usize = 30;

/// Smallest possible serialized transaction input: outpoint + empty script varint + sequence
pub const MIN_TX_IN_SIZE: usize = OUTPOINT_SIZE + 1 + 4;

/// Smallest possible serialized transaction output: value + empty script varint
pub const MIN_TX_OUT_SIZE: usize = 8 + 1;

/// Maximum inventory entries in an inv/getdata message (Bitcoin Core: 50000)
pub const MAX_INV_ITEMS: usize = 50_000;

/// Maximum addresses in an addr message (Bitcoin Core: 1000)
pub const MAX_ADDR_ENTRIES: usize = 1_000;

/// Maximum length of a length-prefixed byte run (Bitcoin Core MAX_SIZE)
pub const MAX_VAR_BYTES: usize = 0x0200_0000;

/// Maximum transactions a merkleblock may claim: max block weight / min tx weight
pub const MAX_MERKLE_TX_COUNT: usize = 4_000_000 / 60;

/// Default bound on inputs or outputs per decoded transaction
pub const MAX_TX_ENTRIES: usize = 100_000;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Output index referenced by coinbase inputs
pub const COINBASE_INDEX: u32 = 0xffffffff;

/// Varint lead bytes selecting the 2-, 4- and 8-byte payload widths
pub const VARINT_U16_PREFIX: u8 = 0xfd;
pub const VARINT_U32_PREFIX: u8 = 0xfe;
pub const VARINT_U64_PREFIX: u8 = 0xff;
