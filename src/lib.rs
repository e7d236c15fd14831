//! # rmap-protocol
//!
//! Wire protocol implementation for RMAP (Remote Memory Access Protocol),
//! a command/reply protocol for reading and writing a remote device's
//! register memory over a point-to-point serial link.
//!
//! This crate provides:
//! - Byte-exact construction of the five packet shapes (read request,
//!   read reply, verified write request, unverified write request,
//!   write reply)
//! - Memory-region validation applied before a read request is built
//! - Instruction-field bit decoding
//! - Header and data CRC-8 computation and verification
//! - Classification and field extraction for received packets
//!
//! The link transport that carries the octet sequences is not part of this
//! crate; builders return owned buffers and parsers consume byte slices.

pub mod codec;
pub mod crc;
pub mod error;
pub mod instruction;
pub mod packet;
pub mod region;

pub use codec::RmapCodec;
pub use crc::{crc8, Crc8};
pub use error::{RegionError, RmapError, Status};
pub use instruction::Instruction;
pub use packet::{Packet, PacketKind};
pub use region::{validate, MemoryArea};

/// Protocol identifier carried in byte 1 of every RMAP packet.
pub const RMAP_PROTOCOL_ID: u8 = 0x01;

/// Logical address of the target node. Command packets open with this byte.
pub const TARGET_LOGICAL_ADDRESS: u8 = 0x51;

/// Logical address of the initiator node. Reply packets open with this byte.
pub const INITIATOR_LOGICAL_ADDRESS: u8 = 0x50;

/// Destination key expected by the target in command packets.
pub const DESTINATION_KEY: u8 = 0xD1;

/// Returns the transaction identifier to use for the next request.
///
/// The transaction identifier is a 16-bit field that associates a reply
/// with the command that caused it; it is incremented (wrapping) for each
/// request, and reply packets copy the identifier of their command.
/// Uniqueness among concurrently outstanding requests is the caller's
/// responsibility.
pub fn next_transaction_id(tid: u16) -> u16 {
    tid.wrapping_add(1)
}
