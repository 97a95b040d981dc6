//! Memory-mapped store
//!
//! Wraps a [`FileBackend`] and serves reads and writes through a shared
//! mapping of the file's extent at open time.
//!
//! ## Mapping Extent
//! The view is never remapped and covers the whole file as allocated at
//! open, so a mapped store never grows its file. Any access ending past the
//! mapped extent fails with `OutsideMapping`; reopening the store maps a file
//! grown through a plain backend.

use memmap2::{MmapMut, MmapOptions};

use crate::config::StoreConfig;
use crate::error::{Result, StoreOp, StrataError};

use super::{platform, FileBackend, Store};

/// Store that copies bytes in and out of a shared file mapping
pub struct MappedBackend {
    /// Live mapping; `None` once closed. Declared before `store` so that a
    /// plain drop also unmaps before the file handle closes.
    map: Option<MmapMut>,
    store: FileBackend,
}

impl MappedBackend {
    /// Open (or create) the file, then map its current extent read/write
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let store = FileBackend::open(config)?;

        let len = usize::try_from(store.allocated_size()).map_err(|_| {
            StrataError::Config(format!(
                "store of {} bytes cannot be mapped on this platform",
                store.allocated_size()
            ))
        })?;

        // SAFETY: the file is open read/write and owned by `store`, which the
        // mapping never outlives (see field order and `close`). Modification
        // of the file by other processes is outside this store's contract.
        let map = unsafe { MmapOptions::new().len(len).map_mut(store.file()?) }
            .map_err(|e| StrataError::platform(StoreOp::Map, e))?;

        tracing::debug!(path = %store.path().display(), len, "mapped store");

        Ok(Self {
            map: Some(map),
            store,
        })
    }

    /// Bytes reachable through the mapping
    pub fn mapped_len(&self) -> u64 {
        self.map.as_ref().map_or(0, |m| m.len() as u64)
    }

    /// The wrapped file store
    pub fn file_backend(&self) -> &FileBackend {
        &self.store
    }

    fn map(&self) -> Result<&MmapMut> {
        self.map.as_ref().ok_or(StrataError::Closed)
    }

    fn check_mapped(&self, end: u64) -> Result<()> {
        let mapped = self.map()?.len() as u64;
        if end > mapped {
            return Err(StrataError::OutsideMapping { end, mapped });
        }
        Ok(())
    }
}

impl Store for MappedBackend {
    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        if buf.is_empty() {
            return Err(StrataError::ZeroLengthBuffer);
        }

        let end = self.store.check_write(buf.len(), offset)?;
        self.check_mapped(end)?;
        // The mapping spans the whole file as allocated at open, so a write
        // that fits the mapping never grows the file.
        debug_assert!(self.store.high_water_mark().max(end) <= self.store.allocated_size());
        self.store.reserve(buf.len(), offset)?;

        let map = self.map.as_mut().ok_or(StrataError::Closed)?;
        map[offset as usize..end as usize].copy_from_slice(buf);

        self.store.advance_mark(end);
        Ok(buf.len())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if buf.is_empty() {
            return Err(StrataError::ZeroLengthBuffer);
        }
        let map = self.map()?;

        let high_water_mark = self.store.high_water_mark();
        let end = offset
            .checked_add(buf.len() as u64)
            .filter(|&end| end <= high_water_mark)
            .ok_or(StrataError::ReadOutOfRange {
                offset,
                len: buf.len(),
                high_water_mark,
            })?;
        self.check_mapped(end)?;

        buf.copy_from_slice(&map[offset as usize..end as usize]);
        Ok(buf.len())
    }

    fn read_persisted(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if buf.is_empty() {
            return Err(StrataError::ZeroLengthBuffer);
        }
        let map = self.map()?;

        let end = offset.checked_add(buf.len() as u64).ok_or(StrataError::OutsideMapping {
            end: u64::MAX,
            mapped: map.len() as u64,
        })?;
        self.check_mapped(end)?;

        buf.copy_from_slice(&map[offset as usize..end as usize]);
        Ok(buf.len())
    }

    fn sync(&self, offset: u64, len: u64) -> Result<()> {
        let map = self.map()?;
        if offset == 0 && len == 0 {
            return map.flush().map_err(|e| platform::flush_error(0, 0, e));
        }

        match offset.checked_add(len) {
            Some(end) if end <= map.len() as u64 => map
                .flush_range(offset as usize, len as usize)
                .map_err(|e| platform::flush_error(offset, len, e)),
            _ => Err(StrataError::InvalidRange { offset, len }),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(map) = self.map.as_ref() {
            map.flush().map_err(|e| platform::flush_error(0, 0, e))?;
            // Unmap before the file handle goes away
            self.map = None;
            tracing::debug!(path = %self.store.path().display(), "unmapped store");
        }

        self.store.close()
    }

    fn high_water_mark(&self) -> u64 {
        self.store.high_water_mark()
    }

    fn allocated_size(&self) -> u64 {
        self.store.allocated_size()
    }

    fn max_size(&self) -> u64 {
        self.store.max_size()
    }

    fn restore_high_water_mark(&mut self, mark: u64) -> Result<()> {
        self.check_mapped(mark)?;
        self.store.restore_high_water_mark(mark)
    }
}
