//! Store header
//!
//! Fixed 48-byte record at offset 0 of a store, describing what the rest of
//! the file holds.
//!
//! ## Layout (little-endian)
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Magic (16) │ Major u16 │ Minor u16 │ Status u16 │ Reserved u16│
//! ├──────────────────────────────────────────────────────────────┤
//! │ Entries u64 (8) │ RecordSize u64 (8) │ LastUpdated i64 (8)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

use super::Store;

/// Magic tag identifying a strata store, zero padded to 16 bytes
pub const MAGIC: &[u8; 12] = b"Savatar tsdb";

/// Current header format major version; readers reject any other
pub const VERSION_MAJOR: u16 = 1;

/// Current header format minor version
pub const VERSION_MINOR: u16 = 0;

/// Encoded header size in bytes
pub const HEADER_SIZE: usize = 48;

/// Whether the store was closed cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    Ok = 0,
    Dirty = 1,
}

impl TryFrom<u16> for HeaderStatus {
    type Error = StrataError;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0 => Ok(HeaderStatus::Ok),
            1 => Ok(HeaderStatus::Dirty),
            other => Err(StrataError::Corruption(format!("unknown header status {}", other))),
        }
    }
}

/// The durable header record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    magic: [u8; 16],
    pub version_major: u16,
    pub version_minor: u16,
    status: u16,
    reserved: u16,
    /// Records stored after the header
    pub entries: u64,
    /// Size of one record in bytes
    pub record_size: u64,
    /// Unix seconds of the last durable header write
    pub last_updated: i64,
}

impl StoreHeader {
    pub fn new(record_size: u64) -> Self {
        let mut magic = [0u8; 16];
        magic[..MAGIC.len()].copy_from_slice(MAGIC);

        Self {
            magic,
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            status: HeaderStatus::Ok as u16,
            reserved: 0,
            entries: 0,
            record_size,
            last_updated: 0,
        }
    }

    pub fn status(&self) -> HeaderStatus {
        // `status` is only ever set from a HeaderStatus or a validated decode
        if self.status == HeaderStatus::Dirty as u16 {
            HeaderStatus::Dirty
        } else {
            HeaderStatus::Ok
        }
    }

    pub fn set_status(&mut self, status: HeaderStatus) {
        self.status = status as u16;
    }

    /// Bytes covered by the header and its records
    ///
    /// Both factors come from disk; a product past `u64` is corruption.
    pub fn space_in_use(&self) -> Result<u64> {
        self.entries
            .checked_mul(self.record_size)
            .and_then(|records| records.checked_add(HEADER_SIZE as u64))
            .ok_or_else(|| {
                StrataError::Corruption(format!(
                    "{} entries of {} bytes overflow the store size",
                    self.entries, self.record_size
                ))
            })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self).map_err(|e| StrataError::Serialization(e.to_string()))?;
        debug_assert_eq!(bytes.len(), HEADER_SIZE);
        Ok(bytes)
    }

    /// Decode and validate a header from the first `HEADER_SIZE` bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StrataError::Corruption(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let header: StoreHeader = bincode::deserialize(&bytes[..HEADER_SIZE])
            .map_err(|e| StrataError::Serialization(e.to_string()))?;

        if &header.magic[..MAGIC.len()] != MAGIC || header.magic[MAGIC.len()..].iter().any(|&b| b != 0) {
            return Err(StrataError::Corruption(format!(
                "invalid header magic: {:?}",
                &header.magic
            )));
        }
        if header.version_major != VERSION_MAJOR {
            return Err(StrataError::Corruption(format!(
                "unsupported header version {}.{}",
                header.version_major, header.version_minor
            )));
        }
        HeaderStatus::try_from(header.status)?;

        Ok(header)
    }
}

/// Usage figures derived from a header and its store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub space_in_use: u64,
    pub space_left: u64,
    pub entries: u64,
    pub record_size: u64,
    pub last_updated: i64,
    pub status: HeaderStatus,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status:        {:?}", self.status)?;
        writeln!(f, "entries:       {}", self.entries)?;
        writeln!(f, "record size:   {}", self.record_size)?;
        writeln!(f, "space in use:  {}", self.space_in_use)?;
        writeln!(f, "space left:    {}", self.space_left)?;
        write!(f, "last updated:  {}", self.last_updated)
    }
}

/// Reads and writes the header of one store
#[derive(Debug, Clone)]
pub struct HeaderManager {
    header: StoreHeader,
}

impl HeaderManager {
    /// Manager for a fresh store holding records of `record_size` bytes
    pub fn new(record_size: u64) -> Self {
        Self {
            header: StoreHeader::new(record_size),
        }
    }

    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    /// Count `n` more records
    pub fn record_entries(&mut self, n: u64) {
        self.header.entries += n;
    }

    pub fn mark_dirty(&mut self) {
        self.header.set_status(HeaderStatus::Dirty);
    }

    pub fn mark_clean(&mut self) {
        self.header.set_status(HeaderStatus::Ok);
    }

    /// Stamp, write at offset 0 and flush exactly the header's span
    pub fn write_header<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.header.last_updated = unix_now();

        let bytes = self.header.encode()?;
        store.write_at(&bytes, 0)?;
        store.sync(0, HEADER_SIZE as u64)?;

        tracing::debug!(
            entries = self.header.entries,
            status = ?self.header.status(),
            "wrote store header"
        );
        Ok(())
    }

    /// Load and validate the header stored at offset 0
    pub fn read_header<S: Store + ?Sized>(&mut self, store: &S) -> Result<&StoreHeader> {
        let mut buf = [0u8; HEADER_SIZE];
        store.read_at(&mut buf, 0)?;
        self.header = StoreHeader::decode(&buf)?;
        Ok(&self.header)
    }

    /// Read the header of a reopened store and reinstate its high-water mark
    /// from the recorded entries
    ///
    /// The store's mark is untouched unless the header is valid.
    pub fn restore<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<&StoreHeader> {
        let mut buf = [0u8; HEADER_SIZE];
        store.read_persisted(&mut buf, 0)?;
        let header = StoreHeader::decode(&buf)?;

        let mark = header.space_in_use()?;
        store.restore_high_water_mark(mark)?;
        self.header = header;

        tracing::debug!(high_water_mark = mark, "restored store from header");
        Ok(&self.header)
    }

    /// Usage figures for `store` as described by the current header
    pub fn stats<S: Store + ?Sized>(&self, store: &S) -> StoreStats {
        let space_in_use = store.high_water_mark();

        StoreStats {
            space_in_use,
            space_left: store.max_size().saturating_sub(space_in_use),
            entries: self.header.entries,
            record_size: self.header.record_size,
            last_updated: self.header.last_updated,
            status: self.header.status(),
        }
    }
}

/// Current time in Unix seconds
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
