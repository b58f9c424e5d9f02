//! Transaction wire objects: outpoints, inputs, outputs and the transaction itself
//!
//! Wire layouts:
//! - OutPoint: hash (32) | index (4)
//! - TxIn: previous output (36) | script length (VarInt) | sig script | sequence (4)
//! - TxOut: value (8, signed) | script length (VarInt) | pk script
//! - Transaction: version (4) | input count (VarInt) | inputs | output count (VarInt) | outputs | lock time (4)

use crate::codec::{Decodable, Encodable};
use crate::constants::*;
use crate::error::Result;
use crate::hash::{double_sha256, hash_from_slice, to_display_hex};
use crate::stream::{ByteReader, ByteWriter};
use crate::types::*;
use crate::varint::varint_size;
use serde::{Deserialize, Serialize};

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(hash: Hash, index: u32) -> Self {
        Self { hash, index }
    }

    /// Build from an arbitrary slice; the hash must be exactly 32 bytes
    pub fn from_slice(hash: &[u8], index: u32) -> Result<Self> {
        Ok(Self {
            hash: hash_from_slice("outpoint hash", hash)?,
            index,
        })
    }

    /// The null outpoint spent by coinbase inputs
    pub fn null() -> Self {
        Self {
            hash: ZERO_HASH,
            index: COINBASE_INDEX,
        }
    }
}

impl Encodable for OutPoint {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write(&self.hash).write_u32(self.index);
    }

    fn encoded_len(&self) -> usize {
        OUTPOINT_SIZE
    }
}

impl Decodable for OutPoint {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let hash = reader.read_hash()?;
        let index = reader.read_u32()?;
        Ok(Self { hash, index })
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub sig_script: ByteString,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(previous_output: OutPoint, sig_script: ByteString, sequence: u32) -> Self {
        Self {
            previous_output,
            sig_script,
            sequence,
        }
    }

    /// A coinbase input spends the all-zero previous hash
    pub fn is_coinbase(&self) -> bool {
        self.previous_output.hash == ZERO_HASH
    }
}

impl Encodable for TxIn {
    fn encode(&self, writer: &mut ByteWriter) {
        self.previous_output.encode(writer);
        writer.write_var_bytes(&self.sig_script).write_u32(self.sequence);
    }

    fn encoded_len(&self) -> usize {
        OUTPOINT_SIZE + varint_size(self.sig_script.len() as u64) + self.sig_script.len() + 4
    }
}

impl Decodable for TxIn {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let previous_output = OutPoint::decode(reader)?;
        let sig_script = reader.read_var_bytes()?;
        let sequence = reader.read_u32()?;
        Ok(Self {
            previous_output,
            sig_script,
            sequence,
        })
    }
}

/// Transaction output. `value` is satoshis; it travels as a signed 8-byte integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: i64,
    pub pk_script: ByteString,
}

impl TxOut {
    pub fn new(value: i64, pk_script: ByteString) -> Self {
        Self { value, pk_script }
    }
}

impl Encodable for TxOut {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_i64(self.value).write_var_bytes(&self.pk_script);
    }

    fn encoded_len(&self) -> usize {
        8 + varint_size(self.pk_script.len() as u64) + self.pk_script.len()
    }
}

impl Decodable for TxOut {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let value = reader.read_i64()?;
        let pk_script = reader.read_var_bytes()?;
        Ok(Self { value, pk_script })
    }
}

/// Full (non-witness) transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub tx_ins: Vec<TxIn>,
    pub tx_outs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(version: i32, tx_ins: Vec<TxIn>, tx_outs: Vec<TxOut>, lock_time: u32) -> Self {
        Self {
            version,
            tx_ins,
            tx_outs,
            lock_time,
        }
    }

    /// Transaction id: SHA256d of the current serialization.
    ///
    /// Recomputed on every call, so it always reflects the current field values.
    pub fn tx_hash(&self) -> Hash {
        double_sha256(&self.to_bytes())
    }

    /// Transaction id in display (reversed hex) form
    pub fn tx_hash_hex(&self) -> String {
        to_display_hex(&self.tx_hash())
    }

    /// True when the first input is a coinbase input
    pub fn is_coinbase(&self) -> bool {
        self.tx_ins.first().map_or(false, TxIn::is_coinbase)
    }

    /// Sum of output values in satoshis, `None` if it does not fit in an `i64`
    pub fn total_output_value(&self) -> Option<i64> {
        self.tx_outs
            .iter()
            .try_fold(0i64, |total, output| total.checked_add(output.value))
    }
}

impl Encodable for Transaction {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_i32(self.version);
        writer.write_varint(self.tx_ins.len() as u64);
        for input in &self.tx_ins {
            input.encode(writer);
        }
        writer.write_varint(self.tx_outs.len() as u64);
        for output in &self.tx_outs {
            output.encode(writer);
        }
        writer.write_u32(self.lock_time);
    }

    fn encoded_len(&self) -> usize {
        4 + varint_size(self.tx_ins.len() as u64)
            + self.tx_ins.iter().map(Encodable::encoded_len).sum::<usize>()
            + varint_size(self.tx_outs.len() as u64)
            + self.tx_outs.iter().map(Encodable::encoded_len).sum::<usize>()
            + 4
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.encoded_len());
        self.encode(&mut writer);
        writer.into_bytes()
    }
}

impl Decodable for Transaction {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let version = reader.read_i32()?;

        let limit = reader.limits().max_tx_inputs;
        let input_count = reader.read_count("transaction input", limit, MIN_TX_IN_SIZE)?;
        let mut tx_ins = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            tx_ins.push(TxIn::decode(reader)?);
        }

        let limit = reader.limits().max_tx_outputs;
        let output_count = reader.read_count("transaction output", limit, MIN_TX_OUT_SIZE)?;
        let mut tx_outs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            tx_outs.push(TxOut::decode(reader)?);
        }

        let lock_time = reader.read_u32()?;

        Ok(Self {
            version,
            tx_ins,
            tx_outs,
            lock_time,
        })
    }
}
