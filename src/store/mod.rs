//! Store Module
//!
//! Growable, offset-addressed durable storage.
//!
//! ## Responsibilities
//! - Positional reads and writes against a single backing file
//! - Geometric file growth in whole units, bounded by a hard ceiling
//! - Ranged or full durability flushes
//! - An optional memory-mapped backend with the same capability surface
//!
//! ## Backends
//! ```text
//! ┌────────────────────────────┐
//! │     dyn Store (capability) │
//! └──────┬──────────────┬──────┘
//!        │              │
//!        ▼              ▼
//! ┌─────────────┐ ┌──────────────────────────┐
//! │ FileBackend │◄┤ MappedBackend            │
//! │ (pread/     │ │ (MmapMut over the file's │
//! │  pwrite)    │ │  extent at open)         │
//! └─────────────┘ └──────────────────────────┘
//! ```
//!
//! ## Concurrency
//! No internal locking. A store has one owner; sharing it requires an
//! external lock held by the layer above.

mod file;
mod header;
mod mapped;
mod platform;

use crate::config::{BackingMode, StoreConfig};
use crate::error::Result;

pub use file::FileBackend;
pub(crate) use header::unix_now;
pub use header::{HeaderManager, HeaderStatus, StoreHeader, StoreStats, HEADER_SIZE, MAGIC, VERSION_MAJOR, VERSION_MINOR};
pub use mapped::MappedBackend;

/// Capability every backing store provides to the layers above
pub trait Store: Send {
    /// Write all of `buf` at `offset`, growing the file as needed
    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize>;

    /// Fill all of `buf` from `offset`
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Fill all of `buf` from `offset` without consulting the high-water mark
    ///
    /// For reading metadata back after a reopen, before the mark is restored.
    fn read_persisted(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Flush `len` bytes at `offset` durably; `(0, 0)` flushes everything
    fn sync(&self, offset: u64, len: u64) -> Result<()>;

    /// Flush fully and release the backing resources
    fn close(&mut self) -> Result<()>;

    /// Largest `offset + len` ever written
    fn high_water_mark(&self) -> u64;

    /// Current size of the backing file
    fn allocated_size(&self) -> u64;

    /// Hard size ceiling
    fn max_size(&self) -> u64;

    /// Reinstate a high-water mark recorded by an upper layer after reopen
    fn restore_high_water_mark(&mut self, mark: u64) -> Result<()>;
}

/// Open or create the store described by `config`, choosing the backend by
/// its backing mode
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn Store>> {
    match config.mode {
        BackingMode::Plain => Ok(Box::new(FileBackend::open(config)?)),
        BackingMode::Mapped => Ok(Box::new(MappedBackend::open(config)?)),
    }
}

/// Size to grow to so that `required` bytes fit: the unit count doubles from
/// the current allocation until it covers `required`, clamped to `max_size`
pub(crate) fn grown_size(allocated: u64, required: u64, unit: u64, max_size: u64) -> u64 {
    let mut units = (allocated / unit).max(1);
    while units.saturating_mul(unit) < required {
        units = units.saturating_mul(2);
    }
    units.saturating_mul(unit).min(max_size)
}
