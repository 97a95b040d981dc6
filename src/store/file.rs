//! Plain-file store
//!
//! Positional reads and writes on one file that grows in whole units.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::{Result, StoreOp, StrataError};

use super::{grown_size, platform, Store};

/// Growable, offset-addressed file store
///
/// ## Invariants
/// - `high_water_mark` never decreases and never exceeds `max_size`
/// - `allocated` is a multiple of `unit_size` and at least `high_water_mark`
pub struct FileBackend {
    /// Open handle; `None` once closed
    file: Option<File>,
    /// Store name (backing file path)
    path: PathBuf,
    unit_size: u64,
    max_size: u64,
    /// Largest `offset + len` ever written
    high_water_mark: u64,
    /// Current file length
    allocated: u64,
}

impl FileBackend {
    /// Open the store at `config.path`, creating it if absent
    ///
    /// A new file is preallocated to one unit. An existing file is reopened
    /// without truncation; its length becomes the allocated size (rounded up
    /// to a whole unit) and the high-water mark starts at zero until an upper
    /// layer restores it.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let path = config.path.clone();
        let created = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path);

        let (file, allocated) = match created {
            Ok(file) => {
                file.set_len(config.unit_size)
                    .map_err(|e| StrataError::platform(StoreOp::Truncate, e))?;
                tracing::info!(path = %path.display(), size = config.unit_size, "created store");
                (file, config.unit_size)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Self::reopen(&path, config)?,
            Err(e) => return Err(StrataError::platform(StoreOp::Create, e)),
        };

        Ok(Self {
            file: Some(file),
            path,
            unit_size: config.unit_size,
            max_size: config.max_size,
            high_water_mark: 0,
            allocated,
        })
    }

    fn reopen(path: &Path, config: &StoreConfig) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| StrataError::platform(StoreOp::Open, e))?;

        let len = file
            .metadata()
            .map_err(|e| StrataError::platform(StoreOp::Metadata, e))?
            .len();

        // Whole units only, and never less than one
        let units = len.div_ceil(config.unit_size).max(1);
        let allocated = units * config.unit_size;
        if allocated > config.max_size {
            return Err(StrataError::SizeLimitExceeded {
                required: allocated,
                max_size: config.max_size,
            });
        }
        if allocated != len {
            file.set_len(allocated)
                .map_err(|e| StrataError::platform(StoreOp::Truncate, e))?;
        }

        tracing::info!(path = %path.display(), size = allocated, "reopened store");
        Ok((file, allocated))
    }

    /// Store name (backing file path)
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn unit_size(&self) -> u64 {
        self.unit_size
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub(crate) fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or(StrataError::Closed)
    }

    /// Validate a write of `len` bytes at `offset` against the ceiling;
    /// returns the write's end offset
    pub(crate) fn check_write(&self, len: usize, offset: u64) -> Result<u64> {
        self.file()?;
        if len == 0 {
            return Err(StrataError::ZeroLengthBuffer);
        }

        let end = offset.checked_add(len as u64).ok_or(StrataError::SizeLimitExceeded {
            required: u64::MAX,
            max_size: self.max_size,
        })?;
        let required = self.high_water_mark.max(end);

        if required > self.max_size {
            tracing::warn!(
                path = %self.path.display(),
                required,
                max_size = self.max_size,
                "store size limit reached"
            );
            return Err(StrataError::SizeLimitExceeded {
                required,
                max_size: self.max_size,
            });
        }

        Ok(end)
    }

    /// Validate a write and grow the file so it fits; returns the write's
    /// end offset
    ///
    /// Fails before touching the file when the write would pass the ceiling.
    pub(crate) fn reserve(&mut self, len: usize, offset: u64) -> Result<u64> {
        let end = self.check_write(len, offset)?;
        let required = self.high_water_mark.max(end);
        if required > self.allocated {
            self.grow(required)?;
        }

        Ok(end)
    }

    /// Record a completed write ending at `end`
    pub(crate) fn advance_mark(&mut self, end: u64) {
        self.high_water_mark = self.high_water_mark.max(end);
    }

    fn grow(&mut self, required: u64) -> Result<()> {
        let new_size = grown_size(self.allocated, required, self.unit_size, self.max_size);

        self.file()?
            .set_len(new_size)
            .map_err(|e| StrataError::platform(StoreOp::Truncate, e))?;

        tracing::debug!(
            path = %self.path.display(),
            from = self.allocated,
            to = new_size,
            "store grew"
        );
        self.allocated = new_size;
        Ok(())
    }
}

impl Store for FileBackend {
    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let end = self.reserve(buf.len(), offset)?;

        let written = platform::write_full(self.file()?, buf, offset)
            .map_err(|e| StrataError::platform(StoreOp::Write, e))?;
        if written != buf.len() {
            return Err(StrataError::ShortTransfer {
                expected: buf.len(),
                actual: written,
            });
        }

        self.advance_mark(end);
        Ok(written)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if buf.is_empty() {
            return Err(StrataError::ZeroLengthBuffer);
        }

        let read = platform::read_full(self.file()?, buf, offset)
            .map_err(|e| StrataError::platform(StoreOp::Read, e))?;
        if read != buf.len() {
            return Err(StrataError::ShortTransfer {
                expected: buf.len(),
                actual: read,
            });
        }

        Ok(read)
    }

    fn read_persisted(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.read_at(buf, offset)
    }

    fn sync(&self, offset: u64, len: u64) -> Result<()> {
        let file = self.file()?;
        let result = if offset == 0 && len == 0 {
            file.sync_all()
        } else {
            platform::sync_range(file, offset, len)
        };

        result.map_err(|e| platform::flush_error(offset, len, e))
    }

    fn close(&mut self) -> Result<()> {
        let Some(file) = self.file.as_ref() else {
            return Ok(());
        };

        file.sync_all().map_err(|e| platform::flush_error(0, 0, e))?;
        self.file = None;

        tracing::info!(
            path = %self.path.display(),
            high_water_mark = self.high_water_mark,
            size = self.allocated,
            "closed store"
        );
        Ok(())
    }

    fn high_water_mark(&self) -> u64 {
        self.high_water_mark
    }

    fn allocated_size(&self) -> u64 {
        self.allocated
    }

    fn max_size(&self) -> u64 {
        self.max_size
    }

    fn restore_high_water_mark(&mut self, mark: u64) -> Result<()> {
        if mark > self.allocated {
            return Err(StrataError::Corruption(format!(
                "recorded high-water mark {} exceeds file size {}",
                mark, self.allocated
            )));
        }

        self.advance_mark(mark);
        Ok(())
    }
}
