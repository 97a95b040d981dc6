//! Checksums
//!
//! Interchangeable data checkers used to verify records written to a store.

use crc::{Crc, CRC_64_GO_ISO};

/// A checksum algorithm behind one signature
///
/// Narrower algorithms zero-extend their result to `u64`.
pub trait DataChecker: Send + Sync {
    fn checksum(&self, data: &[u8]) -> u64;

    /// Significant bits in the result
    fn width(&self) -> u32;
}

/// Available checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Crc32,
    Crc64,
}

/// Build a checker for `kind`
pub fn checker(kind: ChecksumKind) -> Box<dyn DataChecker> {
    match kind {
        ChecksumKind::Crc32 => Box::new(Crc32),
        ChecksumKind::Crc64 => Box::new(Crc64::new()),
    }
}

/// CRC-32 (IEEE)
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl Crc32 {
    pub fn checksum32(&self, data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

impl DataChecker for Crc32 {
    fn checksum(&self, data: &[u8]) -> u64 {
        u64::from(self.checksum32(data))
    }

    fn width(&self) -> u32 {
        32
    }
}

/// CRC-64 (ISO polynomial)
pub struct Crc64 {
    crc: Crc<u64>,
}

impl Crc64 {
    pub fn new() -> Self {
        Self {
            crc: Crc::<u64>::new(&CRC_64_GO_ISO),
        }
    }
}

impl Default for Crc64 {
    fn default() -> Self {
        Self::new()
    }
}

impl DataChecker for Crc64 {
    fn checksum(&self, data: &[u8]) -> u64 {
        self.crc.checksum(data)
    }

    fn width(&self) -> u32 {
        64
    }
}
