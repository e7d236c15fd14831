//! Error types and wire status codes.

use crate::region::MemoryArea;
use std::fmt;
use thiserror::Error;

/// Errors from memory-region validation of an (address, length) pair.
///
/// All variants are detected before any packet bytes are written and are
/// surfaced to the caller unchanged; none indicate a transient condition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    #[error("length {0} is not a multiple of 4")]
    MisalignedLength(u32),

    #[error("address {0:#010x} is not a multiple of 4")]
    MisalignedAddress(u32),

    #[error("address {0:#010x} does not fall in any known memory area")]
    NoSuchRegion(u32),

    #[error("the critical configuration area only allows 4-byte reads, got {0}")]
    FixedLengthViolation(u32),

    #[error("read length {length} exceeds the {max}-byte limit of the {area} area")]
    LengthTooLarge {
        area: MemoryArea,
        length: u32,
        max: u32,
    },

    #[error("read window {address:#010x}+{length} runs past the end of the {area} area")]
    RangeOverflow {
        area: MemoryArea,
        address: u32,
        length: u32,
    },
}

/// Protocol-level errors from packet construction or parsing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RmapError {
    #[error("region validation failed: {0}")]
    InvalidRegion(#[from] RegionError),

    #[error("payload too short: got {got} bytes, need {need}")]
    PayloadTooShort { got: usize, need: usize },

    #[error("address {0:#010x} is outside the critical configuration area, use an unverified write")]
    OutsideCriticalArea(u32),

    #[error("address {0:#010x} is inside the critical configuration area, use a verified write")]
    InsideCriticalArea(u32),

    #[error("packet too short: {0} bytes")]
    PacketTooShort(usize),

    #[error("not an RMAP packet: protocol id {0:#04x}")]
    NotRmap(u8),

    #[error("unrecognized packet shape: logical address {address:#04x}, instruction {instruction:#04x}")]
    UnknownPacketType { address: u8, instruction: u8 },

    #[error("{kind} packets do not carry a {field} field")]
    FieldNotPresent {
        kind: &'static str,
        field: &'static str,
    },

    #[error("header CRC mismatch: expected {expected:#04x}, got {actual:#04x}")]
    HeaderCrcMismatch { expected: u8, actual: u8 },

    #[error("data CRC mismatch: expected {expected:#04x}, got {actual:#04x}")]
    DataCrcMismatch { expected: u8, actual: u8 },

    #[error("instruction field {0:#04x} has the reserved bit set")]
    ReservedInstruction(u8),

    #[error("unknown status code: {0}")]
    UnknownStatus(u8),
}

/// Status codes carried in the status byte of reply packets.
///
/// These codes are part of the wire contract and must remain stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// Command executed successfully.
    Success = 0,
    /// Unspecified error.
    GeneralError = 1,
    /// Unused or unsupported packet type or command code.
    UnusedPacketType = 2,
    /// Destination key did not match.
    InvalidKey = 3,
    /// Data CRC did not match the data received.
    InvalidDataCrc = 4,
    /// Packet ended before the expected amount of data.
    EarlyEop = 5,
    /// More data received than the header announced.
    TooMuchData = 6,
    /// Packet ended with an error end-of-packet marker.
    Eep = 7,
    /// Verified write exceeded the verifiable buffer.
    VerifyBufferOverrun = 9,
    /// Command not implemented or not authorised on this target.
    NotImplemented = 10,
    /// Read-modify-write data length was invalid.
    RmwDataLengthError = 11,
    /// Target logical address did not match.
    InvalidTargetLogicalAddress = 12,
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl TryFrom<u8> for Status {
    type Error = RmapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Success),
            1 => Ok(Status::GeneralError),
            2 => Ok(Status::UnusedPacketType),
            3 => Ok(Status::InvalidKey),
            4 => Ok(Status::InvalidDataCrc),
            5 => Ok(Status::EarlyEop),
            6 => Ok(Status::TooMuchData),
            7 => Ok(Status::Eep),
            9 => Ok(Status::VerifyBufferOverrun),
            10 => Ok(Status::NotImplemented),
            11 => Ok(Status::RmwDataLengthError),
            12 => Ok(Status::InvalidTargetLogicalAddress),
            _ => Err(RmapError::UnknownStatus(value)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "SUCCESS"),
            Status::GeneralError => write!(f, "GENERAL_ERROR"),
            Status::UnusedPacketType => write!(f, "UNUSED_PACKET_TYPE"),
            Status::InvalidKey => write!(f, "INVALID_KEY"),
            Status::InvalidDataCrc => write!(f, "INVALID_DATA_CRC"),
            Status::EarlyEop => write!(f, "EARLY_EOP"),
            Status::TooMuchData => write!(f, "TOO_MUCH_DATA"),
            Status::Eep => write!(f, "EEP"),
            Status::VerifyBufferOverrun => write!(f, "VERIFY_BUFFER_OVERRUN"),
            Status::NotImplemented => write!(f, "NOT_IMPLEMENTED"),
            Status::RmwDataLengthError => write!(f, "RMW_DATA_LENGTH_ERROR"),
            Status::InvalidTargetLogicalAddress => write!(f, "INVALID_TARGET_LOGICAL_ADDRESS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion() {
        assert_eq!(Status::try_from(0u8).unwrap(), Status::Success);
        assert_eq!(Status::try_from(1u8).unwrap(), Status::GeneralError);
        assert_eq!(Status::try_from(3u8).unwrap(), Status::InvalidKey);
        assert_eq!(Status::try_from(10u8).unwrap(), Status::NotImplemented);
        assert_eq!(
            Status::try_from(12u8).unwrap(),
            Status::InvalidTargetLogicalAddress
        );
        assert!(Status::try_from(8u8).is_err());
        assert!(Status::try_from(100u8).is_err());
    }

    #[test]
    fn test_status_is_success() {
        assert!(Status::Success.is_success());
        assert!(!Status::GeneralError.is_success());
        assert!(!Status::InvalidKey.is_success());
    }

    #[test]
    fn test_status_roundtrip_through_u8() {
        for code in [0u8, 1, 2, 3, 4, 5, 6, 7, 9, 10, 11, 12] {
            let status = Status::try_from(code).unwrap();
            assert_eq!(status as u8, code);
        }
    }

    #[test]
    fn test_region_error_display() {
        let err = RegionError::MisalignedLength(7);
        assert!(err.to_string().contains('7'));

        let err = RegionError::NoSuchRegion(0x0100_0000);
        assert!(err.to_string().contains("0x01000000"));

        let err = RegionError::LengthTooLarge {
            area: MemoryArea::GeneralConfiguration,
            length: 512,
            max: 256,
        };
        let msg = err.to_string();
        assert!(msg.contains("512"));
        assert!(msg.contains("256"));
        assert!(msg.contains("general configuration"));
    }

    #[test]
    fn test_rmap_error_display() {
        let err = RmapError::PayloadTooShort { got: 2, need: 4 };
        assert!(err.to_string().contains('2'));
        assert!(err.to_string().contains('4'));

        let err = RmapError::OutsideCriticalArea(0x200);
        assert!(err.to_string().contains("0x00000200"));

        // CRC errors print both values in hex
        let err = RmapError::HeaderCrcMismatch {
            expected: 0xAB,
            actual: 0xCD,
        };
        let msg = err.to_string();
        assert!(msg.contains("0xab"));
        assert!(msg.contains("0xcd"));
    }

    #[test]
    fn test_region_error_converts_to_rmap_error() {
        let err: RmapError = RegionError::MisalignedAddress(3).into();
        assert!(matches!(
            err,
            RmapError::InvalidRegion(RegionError::MisalignedAddress(3))
        ));
    }
}
