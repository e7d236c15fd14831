//! Packet builders for the five RMAP packet shapes.
//!
//! Command packets share a 16-byte header:
//!
//! ```text
//! +-----+-----+-------+-----+-----+-------+-----+---------+--------+-----+
//! | tla | pid | instr | key | ila |  tid  | ext | address | length | crc |
//! | 1   | 1   | 1     | 1   | 1   |  2    | 1   | 4       | 3      | 1   |
//! +-----+-----+-------+-----+-----+-------+-----+---------+--------+-----+
//! ```
//!
//! followed, for write requests, by the data section and its CRC. Reply
//! packets open with the initiator logical address and carry a status byte
//! where commands carry the key. All multi-byte fields are big-endian; the
//! length field is 24 bits wide and must stay 3 bytes in every shape that
//! carries it.
//!
//! Builders are pure: field values in, one owned buffer out, written in a
//! single pass with no partial results on failure. They may be called from
//! multiple threads; the only shared state behind them is the region
//! validator's warn counter.

use crate::crc::{self, Crc8};
use crate::error::RmapError;
use crate::instruction::{self, Instruction};
use crate::packet::Packet;
use crate::region;
use bytes::{BufMut, BytesMut};

/// Size of a read request packet.
pub const READ_REQUEST_SIZE: usize = 16;

/// Size of a write reply packet.
pub const WRITE_REPLY_SIZE: usize = 8;

/// Size of a verified write request packet (16-byte header, 4 data bytes,
/// data CRC).
pub const VERIFIED_WRITE_REQUEST_SIZE: usize = 21;

/// Header size of a read reply, up to and including the header CRC.
pub const READ_REPLY_HEADER_SIZE: usize = 12;

/// Header size of a write request, up to and including the header CRC.
pub const WRITE_REQUEST_HEADER_SIZE: usize = 16;

/// Builds the five RMAP packet shapes as exact octet sequences.
///
/// The checksum is injected as a [`Crc8`] function so deployments can match
/// the variant their target hardware computes; [`RmapCodec::new`] uses the
/// crate's default [`crc::crc8`].
#[derive(Debug, Clone, Copy)]
pub struct RmapCodec {
    crc: Crc8,
}

impl RmapCodec {
    pub fn new() -> Self {
        Self { crc: crc::crc8 }
    }

    /// Uses `crc` for both checksum domains instead of the built-in CRC-8.
    pub fn with_crc(crc: Crc8) -> Self {
        Self { crc }
    }

    /// Builds a 16-byte read request for `length` bytes at `address`.
    ///
    /// The (address, length) pair is validated against the memory-area
    /// rules first; see [`region::validate`] for the meaning of `strict`.
    pub fn build_read_request(
        &self,
        address: u32,
        length: u32,
        tid: u16,
        strict: bool,
    ) -> Result<BytesMut, RmapError> {
        region::validate(address, length, strict)?;

        let mut buf = BytesMut::with_capacity(READ_REQUEST_SIZE);

        buf.put_u8(crate::TARGET_LOGICAL_ADDRESS);
        buf.put_u8(crate::RMAP_PROTOCOL_ID);
        buf.put_u8(instruction::READ_REQUEST);
        buf.put_u8(crate::DESTINATION_KEY);
        buf.put_u8(crate::INITIATOR_LOGICAL_ADDRESS);

        // Transaction identifier (2 bytes)
        buf.put_u16(tid);

        // Extended address (1 byte, unused)
        buf.put_u8(0x00);

        // Address (4 bytes)
        buf.put_u32(address);

        // Data length (3 bytes)
        buf.put_slice(&length.to_be_bytes()[1..]);

        // Header CRC over bytes 0-14
        buf.put_u8((self.crc)(&buf));

        Ok(buf)
    }

    /// Builds a read reply carrying `payload`.
    ///
    /// The instruction is echoed from the command with its command bit
    /// cleared and the reply copies the command's transaction identifier.
    /// If `data_length` disagrees with the payload size the actual size
    /// wins: the packet stays well formed and the mismatch is logged.
    pub fn build_read_reply(
        &self,
        instruction: Instruction,
        tid: u16,
        status: u8,
        payload: &[u8],
        data_length: u32,
    ) -> BytesMut {
        if data_length as usize != payload.len() {
            tracing::warn!(
                "Declared data length {} disagrees with payload size {}, using the payload size",
                data_length,
                payload.len()
            );
        }

        let mut buf = BytesMut::with_capacity(READ_REPLY_HEADER_SIZE + payload.len() + 1);

        buf.put_u8(crate::INITIATOR_LOGICAL_ADDRESS);
        buf.put_u8(crate::RMAP_PROTOCOL_ID);
        buf.put_u8(instruction.with_command_cleared().bits());
        buf.put_u8(status);
        buf.put_u8(crate::TARGET_LOGICAL_ADDRESS);

        // Transaction identifier (2 bytes)
        buf.put_u16(tid);

        // Reserved (1 byte)
        buf.put_u8(0x00);

        // Data length (3 bytes)
        buf.put_slice(&(payload.len() as u32).to_be_bytes()[1..]);

        // Header CRC over bytes 0-10
        buf.put_u8((self.crc)(&buf));

        buf.put_slice(payload);

        // Data CRC over the payload as written
        buf.put_u8((self.crc)(&buf[READ_REPLY_HEADER_SIZE..]));

        buf
    }

    /// Builds a 21-byte verified write request for one 4-byte word.
    ///
    /// Verified writes are defined only inside the critical configuration
    /// area. Exactly the first 4 bytes of `data` are written.
    pub fn build_write_request_verified(
        &self,
        address: u32,
        data: &[u8],
        tid: u16,
    ) -> Result<BytesMut, RmapError> {
        if data.len() < 4 {
            return Err(RmapError::PayloadTooShort {
                got: data.len(),
                need: 4,
            });
        }
        if address > region::CRITICAL_AREA_END {
            return Err(RmapError::OutsideCriticalArea(address));
        }

        let mut buf = BytesMut::with_capacity(VERIFIED_WRITE_REQUEST_SIZE);

        buf.put_u8(crate::TARGET_LOGICAL_ADDRESS);
        buf.put_u8(crate::RMAP_PROTOCOL_ID);
        buf.put_u8(instruction::WRITE_REQUEST_VERIFIED);
        buf.put_u8(crate::DESTINATION_KEY);
        buf.put_u8(crate::INITIATOR_LOGICAL_ADDRESS);

        // Transaction identifier (2 bytes)
        buf.put_u16(tid);

        // Extended address (1 byte, unused)
        buf.put_u8(0x00);

        // Address (4 bytes)
        buf.put_u32(address);

        // Data length (3 bytes, always 4)
        buf.put_slice(&[0x00, 0x00, 0x04]);

        // Header CRC over bytes 0-14
        buf.put_u8((self.crc)(&buf));

        buf.put_slice(&data[..4]);

        // Data CRC over the 4 data bytes
        buf.put_u8((self.crc)(&buf[WRITE_REQUEST_HEADER_SIZE..]));

        Ok(buf)
    }

    /// Builds an unverified write request for `length` bytes at `address`.
    ///
    /// Unverified writes are defined only outside the critical
    /// configuration area; inside it the verified variant must be used.
    /// Data beyond `length` is truncated with a warning.
    pub fn build_write_request_unverified(
        &self,
        address: u32,
        data: &[u8],
        length: u32,
        tid: u16,
    ) -> Result<BytesMut, RmapError> {
        let length = length as usize;
        if data.len() < length {
            return Err(RmapError::PayloadTooShort {
                got: data.len(),
                need: length,
            });
        }
        if data.len() > length {
            tracing::warn!(
                "Payload is {} bytes but only {} were requested, truncating",
                data.len(),
                length
            );
        }
        if address <= region::CRITICAL_AREA_END {
            return Err(RmapError::InsideCriticalArea(address));
        }

        let mut buf = BytesMut::with_capacity(WRITE_REQUEST_HEADER_SIZE + length + 1);

        buf.put_u8(crate::TARGET_LOGICAL_ADDRESS);
        buf.put_u8(crate::RMAP_PROTOCOL_ID);
        buf.put_u8(instruction::WRITE_REQUEST_UNVERIFIED);
        buf.put_u8(crate::DESTINATION_KEY);
        buf.put_u8(crate::INITIATOR_LOGICAL_ADDRESS);

        // Transaction identifier (2 bytes)
        buf.put_u16(tid);

        // Extended address (1 byte, unused)
        buf.put_u8(0x00);

        // Address (4 bytes)
        buf.put_u32(address);

        // Data length (3 bytes)
        buf.put_slice(&(length as u32).to_be_bytes()[1..]);

        // Header CRC over bytes 0-14
        buf.put_u8((self.crc)(&buf));

        buf.put_slice(&data[..length]);

        // Data CRC over the data section
        buf.put_u8((self.crc)(&buf[WRITE_REQUEST_HEADER_SIZE..]));

        Ok(buf)
    }

    /// Builds an 8-byte write reply. No data section, no data CRC.
    pub fn build_write_reply(&self, instruction: Instruction, tid: u16, status: u8) -> BytesMut {
        let mut buf = BytesMut::with_capacity(WRITE_REPLY_SIZE);

        buf.put_u8(crate::INITIATOR_LOGICAL_ADDRESS);
        buf.put_u8(crate::RMAP_PROTOCOL_ID);
        buf.put_u8(instruction.with_command_cleared().bits());
        buf.put_u8(status);
        buf.put_u8(crate::TARGET_LOGICAL_ADDRESS);

        // Transaction identifier (2 bytes)
        buf.put_u16(tid);

        // Header CRC over bytes 0-6
        buf.put_u8((self.crc)(&buf));

        buf
    }

    /// Verifies the header CRC of a received packet with this codec's
    /// checksum function.
    pub fn check_header_crc(&self, packet: &Packet) -> Result<(), RmapError> {
        packet.verify_header_crc(self.crc)
    }

    /// Verifies the data CRC of a received packet with this codec's
    /// checksum function.
    pub fn check_data_crc(&self, packet: &Packet) -> Result<(), RmapError> {
        packet.verify_data_crc(self.crc)
    }
}

impl Default for RmapCodec {
    fn default() -> Self {
        Self::new()
    }
}
