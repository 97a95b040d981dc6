//! Transaction stamp log
//!
//! Records when a transaction began and committed as two checksummed
//! timestamps at fixed offsets of a small store.
//!
//! ## Layout
//! ```text
//! ┌────────────────────────────┬────────────────────────────┐
//! │ Begin: ts i64 | crc u64    │ Commit: ts i64 | crc u64   │
//! │ offset 0 (16 bytes)        │ offset 16 (16 bytes)       │
//! └────────────────────────────┴────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The store is held behind a mutex: this layer provides the exclusive
//! writer the store itself does not.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::checksum::DataChecker;
use crate::config::StoreConfig;
use crate::error::{Result, StrataError};
use crate::store::{open_store, unix_now, Store};

/// Encoded stamp size: timestamp (8) + checksum (8)
pub const STAMP_SIZE: usize = 16;

/// Which of the two stamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampSlot {
    Begin,
    Commit,
}

impl StampSlot {
    fn offset(self) -> u64 {
        match self {
            StampSlot::Begin => 0,
            StampSlot::Commit => STAMP_SIZE as u64,
        }
    }
}

/// A decoded, verified stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    /// Unix seconds
    pub timestamp: i64,
    pub checksum: u64,
}

/// Begin/commit stamps for one transaction
pub struct TxLog {
    path: PathBuf,
    store: Mutex<Box<dyn Store>>,
    checker: Box<dyn DataChecker>,
}

impl TxLog {
    /// Open the log's store and durably record the begin stamp
    pub fn begin(config: &StoreConfig, checker: Box<dyn DataChecker>) -> Result<Self> {
        let store = open_store(config)?;
        let log = Self {
            path: config.path.clone(),
            store: Mutex::new(store),
            checker,
        };

        let stamp = log.write_stamp(StampSlot::Begin, unix_now())?;
        tracing::info!(path = %log.path.display(), timestamp = stamp.timestamp, "transaction started");
        Ok(log)
    }

    /// Durably record the commit stamp and close the store
    pub fn commit(self) -> Result<Stamp> {
        let stamp = self.write_stamp(StampSlot::Commit, unix_now())?;
        self.store.lock().close()?;

        tracing::info!(path = %self.path.display(), timestamp = stamp.timestamp, "transaction committed");
        Ok(stamp)
    }

    /// Store name of this log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `timestamp` into `slot` and flush exactly that stamp
    pub fn write_stamp(&self, slot: StampSlot, timestamp: i64) -> Result<Stamp> {
        let ts = timestamp.to_le_bytes();
        let checksum = self.checker.checksum(&ts);

        let mut buf = [0u8; STAMP_SIZE];
        buf[..8].copy_from_slice(&ts);
        buf[8..].copy_from_slice(&checksum.to_le_bytes());

        let mut store = self.store.lock();
        store.write_at(&buf, slot.offset())?;
        store.sync(slot.offset(), STAMP_SIZE as u64)?;

        tracing::debug!(?slot, timestamp, "wrote transaction stamp");
        Ok(Stamp { timestamp, checksum })
    }

    /// Read `slot` back, verifying its checksum
    pub fn read_stamp(&self, slot: StampSlot) -> Result<Stamp> {
        let mut buf = [0u8; STAMP_SIZE];
        self.store.lock().read_at(&mut buf, slot.offset())?;
        decode_stamp(&buf, self.checker.as_ref())
    }
}

/// Decode a stamp and check it against `checker`
pub fn decode_stamp(buf: &[u8; STAMP_SIZE], checker: &dyn DataChecker) -> Result<Stamp> {
    let mut ts = [0u8; 8];
    let mut sum = [0u8; 8];
    ts.copy_from_slice(&buf[..8]);
    sum.copy_from_slice(&buf[8..]);

    let checksum = u64::from_le_bytes(sum);
    let expected = checker.checksum(&ts);
    if checksum != expected {
        return Err(StrataError::Corruption(format!(
            "stamp checksum mismatch: stored {:#x}, computed {:#x}",
            checksum, expected
        )));
    }

    Ok(Stamp {
        timestamp: i64::from_le_bytes(ts),
        checksum,
    })
}
