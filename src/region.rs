//! Memory-region validation for read requests.
//!
//! The target's register memory is split into four non-overlapping areas,
//! each with its own read-length rule:
//!
//! ```text
//! +------------------------+-------------+-------------+-----------------+
//! | area                   | start       | end         | max read length |
//! +------------------------+-------------+-------------+-----------------+
//! | critical configuration | 0x0000_0000 | 0x0000_00FC | 4 (always)      |
//! | general configuration  | 0x0000_0100 | 0x0000_06FC | 256             |
//! | housekeeping           | 0x0000_0700 | 0x0000_07FC | 256             |
//! | windowing              | 0x0080_0000 | 0x00FF_FFFC | 4096            |
//! +------------------------+-------------+-------------+-----------------+
//! ```
//!
//! The end constant of each area is the last valid start address of a
//! 4-byte word, so a read window may extend 4 bytes past it.

use crate::error::RegionError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// First address of the critical configuration area.
pub const CRITICAL_AREA_START: u32 = 0x0000_0000;
/// Last valid word start of the critical configuration area. Writes at or
/// below this address must use the verified write variant.
pub const CRITICAL_AREA_END: u32 = 0x0000_00FC;
/// First address of the general configuration area.
pub const GENERAL_AREA_START: u32 = 0x0000_0100;
/// Last valid word start of the general configuration area.
pub const GENERAL_AREA_END: u32 = 0x0000_06FC;
/// First address of the housekeeping area.
pub const HK_AREA_START: u32 = 0x0000_0700;
/// Last valid word start of the housekeeping area.
pub const HK_AREA_END: u32 = 0x0000_07FC;
/// First address of the windowing area.
pub const WINDOWING_AREA_START: u32 = 0x0080_0000;
/// Last valid word start of the windowing area.
pub const WINDOWING_AREA_END: u32 = 0x00FF_FFFC;

/// One of the four addressable memory areas of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryArea {
    CriticalConfiguration,
    GeneralConfiguration,
    Housekeeping,
    Windowing,
}

impl MemoryArea {
    /// Returns the area containing `address`, if any.
    pub fn containing(address: u32) -> Option<Self> {
        match address {
            CRITICAL_AREA_START..=CRITICAL_AREA_END => Some(MemoryArea::CriticalConfiguration),
            GENERAL_AREA_START..=GENERAL_AREA_END => Some(MemoryArea::GeneralConfiguration),
            HK_AREA_START..=HK_AREA_END => Some(MemoryArea::Housekeeping),
            WINDOWING_AREA_START..=WINDOWING_AREA_END => Some(MemoryArea::Windowing),
            _ => None,
        }
    }

    /// First address of the area.
    pub fn start(&self) -> u32 {
        match self {
            MemoryArea::CriticalConfiguration => CRITICAL_AREA_START,
            MemoryArea::GeneralConfiguration => GENERAL_AREA_START,
            MemoryArea::Housekeeping => HK_AREA_START,
            MemoryArea::Windowing => WINDOWING_AREA_START,
        }
    }

    /// Last valid 4-byte word start of the area.
    pub fn end(&self) -> u32 {
        match self {
            MemoryArea::CriticalConfiguration => CRITICAL_AREA_END,
            MemoryArea::GeneralConfiguration => GENERAL_AREA_END,
            MemoryArea::Housekeeping => HK_AREA_END,
            MemoryArea::Windowing => WINDOWING_AREA_END,
        }
    }

    /// Largest read length the area allows.
    pub fn max_read_length(&self) -> u32 {
        match self {
            MemoryArea::CriticalConfiguration => 4,
            MemoryArea::GeneralConfiguration => 256,
            MemoryArea::Housekeeping => 256,
            MemoryArea::Windowing => 4096,
        }
    }

    /// The mandatory read length for areas that only allow one, currently
    /// just the critical configuration area.
    pub fn fixed_read_length(&self) -> Option<u32> {
        match self {
            MemoryArea::CriticalConfiguration => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for MemoryArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryArea::CriticalConfiguration => write!(f, "critical configuration"),
            MemoryArea::GeneralConfiguration => write!(f, "general configuration"),
            MemoryArea::Housekeeping => write!(f, "housekeeping"),
            MemoryArea::Windowing => write!(f, "windowing"),
        }
    }
}

/// How often the relaxed-mode warning repeats, in calls.
const RELAXED_WARN_INTERVAL: u64 = 1000;

static RELAXED_CALLS: AtomicU64 = AtomicU64::new(0);

/// Validates an (address, length) pair against the memory-area rules.
///
/// With `strict` set, the pair must be 4-byte aligned, fall inside exactly
/// one area, and respect that area's length rule. With `strict` unset the
/// call always succeeds: this is a deliberate relaxation for targets that
/// do not enforce the memory-area restrictions, and it forfeits the
/// critical-area guarantees of the protocol. Future targets may enforce
/// the restrictions again, so callers should treat the relaxed mode as a
/// temporary deviation. The relaxed path logs a warning on first use and
/// once every 1000 calls thereafter.
pub fn validate(address: u32, length: u32, strict: bool) -> Result<(), RegionError> {
    if !strict {
        let calls = RELAXED_CALLS.fetch_add(1, Ordering::Relaxed);
        if calls % RELAXED_WARN_INTERVAL == 0 {
            tracing::warn!(
                "Memory-area restrictions are disabled, request {:#010x}+{} not validated",
                address,
                length
            );
        }
        return Ok(());
    }

    if length % 4 != 0 {
        return Err(RegionError::MisalignedLength(length));
    }
    if address % 4 != 0 {
        return Err(RegionError::MisalignedAddress(address));
    }

    let area = MemoryArea::containing(address).ok_or(RegionError::NoSuchRegion(address))?;

    if let Some(fixed) = area.fixed_read_length() {
        if length != fixed {
            return Err(RegionError::FixedLengthViolation(length));
        }
        return Ok(());
    }

    if length > area.max_read_length() {
        return Err(RegionError::LengthTooLarge {
            area,
            length,
            max: area.max_read_length(),
        });
    }

    // The window may end at end() + 4, the byte past the last valid word.
    if u64::from(address) + u64::from(length) > u64::from(area.end()) + 4 {
        return Err(RegionError::RangeOverflow {
            area,
            address,
            length,
        });
    }

    Ok(())
}
