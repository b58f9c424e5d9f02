//! Peer address records and inventory messages
//!
//! Wire layouts:
//! - NetworkAddress: services (8) | address (16, IPv6 or IPv4-mapped) | port (2, big-endian)
//! - NetworkAddressTimestamp: time (4) | NetworkAddress
//! - InvVect: type (4) | hash (32)
//! - Inv / GetData: count (VarInt) | InvVect[count]
//! - Addr: count (VarInt) | NetworkAddressTimestamp[count]

use crate::codec::{Decodable, Encodable};
use crate::constants::*;
use crate::error::{Result, WireError};
use crate::hash::to_display_hex;
use crate::stream::{ByteReader, ByteWriter};
use crate::types::Hash;
use crate::varint::varint_size;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

/// Peer address as carried in version messages (no timestamp)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkAddress {
    pub services: u64,
    pub address: [u8; 16],
    pub port: u16,
}

impl NetworkAddress {
    pub fn new(services: u64, address: [u8; 16], port: u16) -> Self {
        Self {
            services,
            address,
            port,
        }
    }

    /// IPv4 addresses are stored IPv4-mapped (`::ffff:a.b.c.d`)
    pub fn from_socket_addr(addr: SocketAddr, services: u64) -> Self {
        let ip = match addr.ip() {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        Self {
            services,
            address: ip.octets(),
            port: addr.port(),
        }
    }

    /// Build from an arbitrary slice; the address must be exactly 16 bytes
    pub fn from_slice(services: u64, address: &[u8], port: u16) -> Result<Self> {
        let address = <[u8; 16]>::try_from(address).map_err(|_| WireError::InvalidFieldLength {
            field: "network address",
            expected: 16,
            actual: address.len(),
        })?;
        Ok(Self::new(services, address, port))
    }

    /// Socket address, unwrapping IPv4-mapped addresses back to IPv4
    pub fn socket_addr(&self) -> SocketAddr {
        let v6 = Ipv6Addr::from(self.address);
        let ip = match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        };
        SocketAddr::new(ip, self.port)
    }
}

impl Encodable for NetworkAddress {
    fn encode(&self, writer: &mut ByteWriter) {
        writer
            .write_u64(self.services)
            .write(&self.address)
            .write_u16_be(self.port);
    }

    fn encoded_len(&self) -> usize {
        NETWORK_ADDRESS_SIZE
    }
}

impl Decodable for NetworkAddress {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let services = reader.read_u64()?;
        let address = reader.read_array::<16>()?;
        let port = reader.read_u16_be()?;
        Ok(Self {
            services,
            address,
            port,
        })
    }
}

/// Peer address with its last-seen time, as carried in addr messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkAddressTimestamp {
    pub time: u32,
    pub address: NetworkAddress,
}

impl NetworkAddressTimestamp {
    pub fn new(time: u32, address: NetworkAddress) -> Self {
        Self { time, address }
    }
}

impl Encodable for NetworkAddressTimestamp {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.time);
        self.address.encode(writer);
    }

    fn encoded_len(&self) -> usize {
        NETWORK_ADDRESS_TIMESTAMP_SIZE
    }
}

impl Decodable for NetworkAddressTimestamp {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let time = reader.read_u32()?;
        let address = NetworkAddress::decode(reader)?;
        Ok(Self { time, address })
    }
}

/// Kind of object an inventory vector refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum InvType {
    Error = 0,
    Tx = 1,
    Block = 2,
    FilteredBlock = 3,
    CompactBlock = 4,
}

impl InvType {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(InvType::Error),
            1 => Ok(InvType::Tx),
            2 => Ok(InvType::Block),
            3 => Ok(InvType::FilteredBlock),
            4 => Ok(InvType::CompactBlock),
            other => Err(WireError::UnknownInventoryType(other)),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for InvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvType::Error => "error",
            InvType::Tx => "tx",
            InvType::Block => "block",
            InvType::FilteredBlock => "filtered_block",
            InvType::CompactBlock => "compact_block",
        };
        f.write_str(name)
    }
}

/// Inventory vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvVect {
    pub inv_type: InvType,
    pub hash: Hash,
}

impl InvVect {
    pub fn new(inv_type: InvType, hash: Hash) -> Self {
        Self { inv_type, hash }
    }
}

impl fmt::Display for InvVect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.inv_type, to_display_hex(&self.hash))
    }
}

impl Encodable for InvVect {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.inv_type.as_u32()).write(&self.hash);
    }

    fn encoded_len(&self) -> usize {
        INV_VECT_SIZE
    }
}

impl Decodable for InvVect {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let inv_type = InvType::from_u32(reader.read_u32()?)?;
        let hash = reader.read_hash()?;
        Ok(Self { inv_type, hash })
    }
}

/// Inventory announcement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inv {
    pub inventory: Vec<InvVect>,
}

/// getdata shares the inv layout
pub type GetData = Inv;

impl Inv {
    pub fn new(inventory: Vec<InvVect>) -> Self {
        Self { inventory }
    }

    /// One entry of `inv_type` per hash, e.g. filtered-block requests for a run of headers
    pub fn for_hashes(inv_type: InvType, hashes: &[Hash]) -> Self {
        Self {
            inventory: hashes.iter().map(|hash| InvVect::new(inv_type, *hash)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.inventory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inventory.is_empty()
    }
}

impl Encodable for Inv {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_varint(self.inventory.len() as u64);
        for item in &self.inventory {
            item.encode(writer);
        }
    }

    fn encoded_len(&self) -> usize {
        varint_size(self.inventory.len() as u64) + self.inventory.len() * INV_VECT_SIZE
    }
}

impl Decodable for Inv {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let limit = reader.limits().max_inv_items;
        let count = reader.read_count("inventory", limit, INV_VECT_SIZE)?;
        let mut inventory = Vec::with_capacity(count);
        for _ in 0..count {
            inventory.push(InvVect::decode(reader)?);
        }
        Ok(Self { inventory })
    }
}

/// Address announcement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addr {
    pub addresses: Vec<NetworkAddressTimestamp>,
}

impl Addr {
    pub fn new(addresses: Vec<NetworkAddressTimestamp>) -> Self {
        Self { addresses }
    }
}

impl Encodable for Addr {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_varint(self.addresses.len() as u64);
        for entry in &self.addresses {
            entry.encode(writer);
        }
    }

    fn encoded_len(&self) -> usize {
        varint_size(self.addresses.len() as u64)
            + self.addresses.len() * NETWORK_ADDRESS_TIMESTAMP_SIZE
    }
}

impl Decodable for Addr {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let limit = reader.limits().max_addr_entries;
        let count = reader.read_count("address", limit, NETWORK_ADDRESS_TIMESTAMP_SIZE)?;
        let mut addresses = Vec::with_capacity(count);
        for _ in 0..count {
            addresses.push(NetworkAddressTimestamp::decode(reader)?);
        }
        Ok(Self { addresses })
    }
}
