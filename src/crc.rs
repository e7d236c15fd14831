//! CRC-8 checksum primitive for RMAP headers and data sections.
//!
//! Every request and reply carries a header CRC computed over the header
//! bytes that precede it and, when a data section exists, a data CRC over
//! that section. The codec consumes the checksum through the [`Crc8`]
//! function type so a deployment can substitute the exact variant its
//! target hardware computes; [`crc8`] implements the reflected 0x07
//! polynomial used by the RMAP link standard.

/// A CRC-8 function over a byte slice.
///
/// Must be deterministic and side-effect free. The receiving side is
/// expected to compute the same function over the same byte ranges.
pub type Crc8 = fn(&[u8]) -> u8;

/// Bit-reversed form of the generator polynomial x^8 + x^2 + x + 1.
const POLY_REFLECTED: u8 = 0xE0;

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x01 != 0 {
                (crc >> 1) ^ POLY_REFLECTED
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u8; 256] = build_table();

/// Computes the CRC-8 of `data` (initial value 0x00, LSB first).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc = CRC_TABLE[(crc ^ byte) as usize];
    }
    crc
}
