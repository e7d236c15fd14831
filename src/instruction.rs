//! RMAP instruction field decoding.
//!
//! The instruction field is the single byte at offset 2 of every packet.
//! Bit layout (MSB to LSB):
//!
//! ```text
//! +----------+---------+-------+--------+-------+-----------+------------+
//! | reserved | command | write | verify | reply | increment | reply addr |
//! |  1 bit   |  1 bit  | 1 bit | 1 bit  | 1 bit |   1 bit   |   2 bits   |
//! +----------+---------+-------+--------+-------+-----------+------------+
//! ```
//!
//! The reserved bit must be zero. The two reply-address bits encode the
//! size of the reply address field in 4-byte units.

use std::fmt;

/// Instruction byte of a read request: command, read, increment, reply.
pub const READ_REQUEST: u8 = 0x4C;

/// Instruction byte of a verified write request.
pub const WRITE_REQUEST_VERIFIED: u8 = 0x7C;

/// Instruction byte of an unverified write request.
pub const WRITE_REQUEST_UNVERIFIED: u8 = 0x6C;

/// Instruction byte of a read reply (command bit cleared).
pub const READ_REPLY: u8 = 0x0C;

/// Instruction byte of a verified-write reply.
pub const WRITE_REPLY_VERIFIED: u8 = 0x3C;

/// Instruction byte of an unverified-write reply.
pub const WRITE_REPLY_UNVERIFIED: u8 = 0x2C;

/// The instruction field of an RMAP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction(u8);

impl Instruction {
    const RESERVED: u8 = 0b1000_0000;
    const COMMAND: u8 = 0b0100_0000;
    const WRITE: u8 = 0b0010_0000;
    const VERIFY: u8 = 0b0001_0000;
    const REPLY: u8 = 0b0000_1000;
    const INCREMENT: u8 = 0b0000_0100;
    const REPLY_ADDRESS: u8 = 0b0000_0011;

    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// The reserved bit; must be zero for a well-formed packet.
    pub fn is_reserved(&self) -> bool {
        self.0 & Self::RESERVED != 0
    }

    /// True for command packets (requests).
    pub fn is_command(&self) -> bool {
        self.0 & Self::COMMAND != 0
    }

    /// True for reply packets.
    pub fn is_reply(&self) -> bool {
        !self.is_command()
    }

    /// True for write operations.
    pub fn is_write(&self) -> bool {
        self.0 & Self::WRITE != 0
    }

    /// True for read operations.
    pub fn is_read(&self) -> bool {
        !self.is_write()
    }

    /// True when data must be verified before it is written.
    pub fn is_verify(&self) -> bool {
        self.0 & Self::VERIFY != 0
    }

    /// True when the command requests a reply from the target.
    ///
    /// This does not test whether the packet is a reply; use
    /// [`is_reply`](Self::is_reply) for that.
    pub fn is_reply_required(&self) -> bool {
        self.0 & Self::REPLY != 0
    }

    /// True when data is written to sequential memory addresses.
    pub fn is_increment(&self) -> bool {
        self.0 & Self::INCREMENT != 0
    }

    /// Size in bytes of the reply address field (0, 4, 8 or 12).
    pub fn reply_address_length(&self) -> usize {
        ((self.0 & Self::REPLY_ADDRESS) << 2) as usize
    }

    /// Returns the instruction with the command bit cleared, as placed in
    /// the header of a reply packet.
    pub fn with_command_cleared(&self) -> Self {
        Self(self.0 & !Self::COMMAND)
    }
}

impl From<u8> for Instruction {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {}; {}; {}; {}",
            if self.is_command() { "command" } else { "reply" },
            if self.is_write() { "write" } else { "read" },
            if self.is_verify() { "verify" } else { "don't verify" },
            if self.is_reply_required() { "reply" } else { "don't reply" },
            if self.is_increment() { "increment" } else { "no increment" },
        )?;
        if self.reply_address_length() > 0 {
            write!(f, "; reply address = {} bytes", self.reply_address_length())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_bits() {
        let instruction = Instruction::new(READ_REQUEST);
        assert!(!instruction.is_reserved());
        assert!(instruction.is_command());
        assert!(instruction.is_read());
        assert!(!instruction.is_write());
        assert!(!instruction.is_verify());
        assert!(instruction.is_reply_required());
        assert!(instruction.is_increment());
        assert_eq!(instruction.reply_address_length(), 0);
    }

    #[test]
    fn test_verified_write_bits() {
        let instruction = Instruction::new(WRITE_REQUEST_VERIFIED);
        assert!(instruction.is_command());
        assert!(instruction.is_write());
        assert!(instruction.is_verify());
        assert!(instruction.is_reply_required());
        assert!(instruction.is_increment());
    }

    #[test]
    fn test_unverified_write_bits() {
        let instruction = Instruction::new(WRITE_REQUEST_UNVERIFIED);
        assert!(instruction.is_command());
        assert!(instruction.is_write());
        assert!(!instruction.is_verify());
    }

    #[test]
    fn test_command_bit_cleared_yields_reply_codes() {
        assert_eq!(
            Instruction::new(READ_REQUEST).with_command_cleared().bits(),
            READ_REPLY
        );
        assert_eq!(
            Instruction::new(WRITE_REQUEST_VERIFIED)
                .with_command_cleared()
                .bits(),
            WRITE_REPLY_VERIFIED
        );
        assert_eq!(
            Instruction::new(WRITE_REQUEST_UNVERIFIED)
                .with_command_cleared()
                .bits(),
            WRITE_REPLY_UNVERIFIED
        );
    }

    #[test]
    fn test_reply_codes_are_replies() {
        for code in [READ_REPLY, WRITE_REPLY_VERIFIED, WRITE_REPLY_UNVERIFIED] {
            assert!(Instruction::new(code).is_reply());
        }
    }

    #[test]
    fn test_reserved_bit() {
        assert!(Instruction::new(0b1100_1100).is_reserved());
        assert!(!Instruction::new(0b0100_1100).is_reserved());
    }

    #[test]
    fn test_reply_address_length_table() {
        assert_eq!(Instruction::new(0b0100_1100).reply_address_length(), 0);
        assert_eq!(Instruction::new(0b0100_1101).reply_address_length(), 4);
        assert_eq!(Instruction::new(0b0100_1110).reply_address_length(), 8);
        assert_eq!(Instruction::new(0b0100_1111).reply_address_length(), 12);
    }

    #[test]
    fn test_display() {
        let msg = Instruction::new(READ_REQUEST).to_string();
        assert!(msg.contains("command"));
        assert!(msg.contains("read"));
        assert!(msg.contains("increment"));

        let msg = Instruction::new(WRITE_REPLY_VERIFIED).to_string();
        assert!(msg.contains("reply"));
        assert!(msg.contains("write"));
        assert!(msg.contains("verify"));
    }
}
