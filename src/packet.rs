//! Received-packet classification and field extraction.
//!
//! A target implementation needs to re-derive the address, length and
//! transaction identifier of an inbound command before it can answer it;
//! an initiator needs the status, transaction identifier and data of an
//! inbound reply. [`Packet::parse`] classifies a received octet sequence
//! into one of the four shapes and the accessors read its fields at the
//! offsets that shape defines. Fields a shape does not carry are reported
//! as [`RmapError::FieldNotPresent`] instead of decoding garbage.

use crate::crc::Crc8;
use crate::error::RmapError;
use crate::instruction::{self, Instruction};
use bytes::Bytes;
use std::fmt;

/// Size of the smallest RMAP packet, a write reply.
pub const MIN_PACKET_SIZE: usize = 8;

/// The four packet shapes this crate classifies.
///
/// Verified and unverified write requests share a shape and are told apart
/// through the instruction field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    ReadRequest,
    WriteRequest,
    ReadReply,
    WriteReply,
}

impl PacketKind {
    fn name(&self) -> &'static str {
        match self {
            PacketKind::ReadRequest => "read request",
            PacketKind::WriteRequest => "write request",
            PacketKind::ReadReply => "read reply",
            PacketKind::WriteReply => "write reply",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A received RMAP packet, classified and ready for field extraction.
#[derive(Debug, Clone)]
pub struct Packet {
    kind: PacketKind,
    bytes: Bytes,
}

impl Packet {
    /// Classifies a received octet sequence.
    ///
    /// Checks the protocol identifier, the reserved instruction bit and
    /// the structural minimum length of the detected shape. CRC fields are
    /// not verified here; use [`verify_header_crc`](Self::verify_header_crc)
    /// and [`verify_data_crc`](Self::verify_data_crc).
    pub fn parse(data: &[u8]) -> Result<Self, RmapError> {
        if data.len() < MIN_PACKET_SIZE {
            return Err(RmapError::PacketTooShort(data.len()));
        }
        if data[1] != crate::RMAP_PROTOCOL_ID {
            return Err(RmapError::NotRmap(data[1]));
        }

        let instruction = Instruction::new(data[2]);
        if instruction.is_reserved() {
            return Err(RmapError::ReservedInstruction(data[2]));
        }

        let kind = if is_read_request(data) {
            PacketKind::ReadRequest
        } else if is_write_request(data) {
            PacketKind::WriteRequest
        } else if is_read_reply(data) {
            PacketKind::ReadReply
        } else if is_write_reply(data) {
            PacketKind::WriteReply
        } else {
            return Err(RmapError::UnknownPacketType {
                address: data[0],
                instruction: data[2],
            });
        };

        let reply_address = instruction.reply_address_length();
        let min_len = match kind {
            PacketKind::ReadRequest => 16 + reply_address,
            // 16-byte header, zero or more data bytes, data CRC
            PacketKind::WriteRequest => 17 + reply_address,
            // 12-byte header, zero or more data bytes, data CRC
            PacketKind::ReadReply => 13 + reply_address,
            PacketKind::WriteReply => 8 + reply_address,
        };
        if data.len() < min_len {
            return Err(RmapError::PacketTooShort(data.len()));
        }

        Ok(Self {
            kind,
            bytes: Bytes::copy_from_slice(data),
        })
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    /// The raw octet sequence.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The logical address in byte 0: the target for commands, the
    /// initiator for replies.
    pub fn logical_address(&self) -> u8 {
        self.bytes[0]
    }

    pub fn instruction(&self) -> Instruction {
        Instruction::new(self.bytes[2])
    }

    fn reply_address_len(&self) -> usize {
        self.instruction().reply_address_length()
    }

    fn is_command(&self) -> bool {
        matches!(self.kind, PacketKind::ReadRequest | PacketKind::WriteRequest)
    }

    /// The destination key of a command packet.
    pub fn key(&self) -> Result<u8, RmapError> {
        if !self.is_command() {
            return Err(RmapError::FieldNotPresent {
                kind: self.kind.name(),
                field: "key",
            });
        }
        Ok(self.bytes[3])
    }

    /// The status byte of a reply packet.
    pub fn status(&self) -> Result<u8, RmapError> {
        if self.is_command() {
            return Err(RmapError::FieldNotPresent {
                kind: self.kind.name(),
                field: "status",
            });
        }
        Ok(self.bytes[3])
    }

    /// The transaction identifier correlating this packet with its
    /// counterpart.
    pub fn transaction_id(&self) -> u16 {
        let idx = 5 + self.reply_address_len();
        u16::from_be_bytes([self.bytes[idx], self.bytes[idx + 1]])
    }

    /// The memory address of a command packet, including the extended
    /// address byte (40-bit addressing).
    pub fn address(&self) -> Result<u64, RmapError> {
        if !self.is_command() {
            return Err(RmapError::FieldNotPresent {
                kind: self.kind.name(),
                field: "address",
            });
        }
        let idx = 7 + self.reply_address_len();
        let extended = self.bytes[idx];
        let low = u32::from_be_bytes([
            self.bytes[idx + 1],
            self.bytes[idx + 2],
            self.bytes[idx + 3],
            self.bytes[idx + 4],
        ]);
        Ok(u64::from(low) | (u64::from(extended) << 32))
    }

    /// The 24-bit data length field. Write replies have none.
    pub fn data_length(&self) -> Result<u32, RmapError> {
        if self.kind == PacketKind::WriteReply {
            return Err(RmapError::FieldNotPresent {
                kind: self.kind.name(),
                field: "data length",
            });
        }
        let offset = if self.is_command() { 12 } else { 8 };
        let idx = offset + self.reply_address_len();
        Ok(u32::from_be_bytes([
            0,
            self.bytes[idx],
            self.bytes[idx + 1],
            self.bytes[idx + 2],
        ]))
    }

    /// Byte offset of the data section for shapes that carry one.
    fn data_offset(&self) -> usize {
        let offset = if self.instruction().is_read() { 12 } else { 16 };
        offset + self.reply_address_len()
    }

    /// The data section of a write request or read reply.
    pub fn data(&self) -> Result<&[u8], RmapError> {
        match self.kind {
            PacketKind::WriteRequest | PacketKind::ReadReply => {}
            _ => {
                return Err(RmapError::FieldNotPresent {
                    kind: self.kind.name(),
                    field: "data",
                })
            }
        }
        let idx = self.data_offset();
        let data_length = self.data_length()? as usize;
        // One more byte for the data CRC must follow the data section.
        if idx + data_length + 1 > self.bytes.len() {
            return Err(RmapError::PacketTooShort(self.bytes.len()));
        }
        Ok(&self.bytes[idx..idx + data_length])
    }

    /// Byte offset of the header CRC for this shape.
    fn header_crc_offset(&self) -> usize {
        let offset = match self.kind {
            PacketKind::ReadRequest | PacketKind::WriteRequest => 15,
            PacketKind::WriteReply => 7,
            PacketKind::ReadReply => 11,
        };
        offset + self.reply_address_len()
    }

    /// The header CRC byte as found in the packet.
    pub fn header_crc(&self) -> u8 {
        self.bytes[self.header_crc_offset()]
    }

    /// The data CRC byte as found in the packet.
    pub fn data_crc(&self) -> Result<u8, RmapError> {
        match self.kind {
            PacketKind::WriteRequest | PacketKind::ReadReply => {}
            _ => {
                return Err(RmapError::FieldNotPresent {
                    kind: self.kind.name(),
                    field: "data CRC",
                })
            }
        }
        let data_length = self.data_length()? as usize;
        let idx = self.data_offset() + data_length;
        if idx >= self.bytes.len() {
            return Err(RmapError::PacketTooShort(self.bytes.len()));
        }
        Ok(self.bytes[idx])
    }

    /// Verifies the header CRC against a checksum over the preceding bytes.
    pub fn verify_header_crc(&self, crc: Crc8) -> Result<(), RmapError> {
        let idx = self.header_crc_offset();
        let expected = self.bytes[idx];
        let actual = crc(&self.bytes[..idx]);
        if expected != actual {
            return Err(RmapError::HeaderCrcMismatch { expected, actual });
        }
        Ok(())
    }

    /// Verifies the data CRC against a checksum over the data section.
    ///
    /// Fails with [`RmapError::FieldNotPresent`] on shapes without a data
    /// section.
    pub fn verify_data_crc(&self, crc: Crc8) -> Result<(), RmapError> {
        let data = self.data()?;
        let expected = self.data_crc()?;
        let actual = crc(data);
        if expected != actual {
            return Err(RmapError::DataCrcMismatch { expected, actual });
        }
        Ok(())
    }
}

fn is_read_request(data: &[u8]) -> bool {
    data[0] == crate::TARGET_LOGICAL_ADDRESS
        && data[2] == instruction::READ_REQUEST
        && data[3] == crate::DESTINATION_KEY
}

fn is_write_request(data: &[u8]) -> bool {
    data[0] == crate::TARGET_LOGICAL_ADDRESS
        && (data[2] == instruction::WRITE_REQUEST_VERIFIED
            || data[2] == instruction::WRITE_REQUEST_UNVERIFIED)
        && data[3] == crate::DESTINATION_KEY
}

fn is_read_reply(data: &[u8]) -> bool {
    data[0] == crate::INITIATOR_LOGICAL_ADDRESS
        && data[2] == instruction::READ_REPLY
        && data[4] == crate::TARGET_LOGICAL_ADDRESS
}

fn is_write_reply(data: &[u8]) -> bool {
    data[0] == crate::INITIATOR_LOGICAL_ADDRESS
        && (data[2] == instruction::WRITE_REPLY_VERIFIED
            || data[2] == instruction::WRITE_REPLY_UNVERIFIED)
        && data[4] == crate::TARGET_LOGICAL_ADDRESS
}

const PREVIEW_LIMIT: usize = 32;

fn hex_preview(data: &[u8]) -> String {
    let mut out = data
        .iter()
        .take(PREVIEW_LIMIT)
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");
    if data.len() > PREVIEW_LIMIT {
        out.push_str(" ...");
    }
    out
}

fn ascii_preview(data: &[u8]) -> String {
    let mut out: String = data
        .iter()
        .take(PREVIEW_LIMIT)
        .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
        .collect();
    if data.len() > PREVIEW_LIMIT {
        out.push_str(" ...");
    }
    out
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match (self.kind, self.instruction().is_verify()) {
            (PacketKind::WriteRequest, true) => "RMAP verified write request",
            (PacketKind::WriteRequest, false) => "RMAP unverified write request",
            (PacketKind::ReadRequest, _) => "RMAP read request",
            (PacketKind::ReadReply, _) => "RMAP read reply",
            (PacketKind::WriteReply, _) => "RMAP write reply",
        };
        writeln!(f, "{prefix} ({} bytes)", self.bytes.len())?;
        writeln!(
            f,
            "Instruction:        {:#04x} ({})",
            self.instruction().bits(),
            self.instruction()
        )?;
        writeln!(
            f,
            "Transaction ID:     {:#06x} ({})",
            self.transaction_id(),
            self.transaction_id()
        )?;
        if let Ok(status) = self.status() {
            writeln!(f, "Status:             {status:#04x}")?;
        }
        if let Ok(address) = self.address() {
            writeln!(f, "Address:            {address:#010x}")?;
        }
        if let Ok(data_length) = self.data_length() {
            writeln!(f, "Data Length:        {data_length}")?;
        }
        writeln!(f, "Header CRC:         {:#04x}", self.header_crc())?;
        if let Ok(data) = self.data() {
            writeln!(f, "Data (hex):         {}", hex_preview(data))?;
            writeln!(f, "Data (ascii):       {}", ascii_preview(data))?;
        }
        if let Ok(data_crc) = self.data_crc() {
            writeln!(f, "Data CRC:           {data_crc:#04x}")?;
        }
        Ok(())
    }
}
