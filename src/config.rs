//! Configuration for strata stores
//!
//! Every size, ceiling and name is an explicit field; the constants below are
//! presets callers may pass in, never implicit fallbacks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

// =============================================================================
// Size Presets
// =============================================================================

/// Data file growth unit (~64 GiB)
pub const FILE_SIZE_DB: u64 = 4096 * 4096 * 4096;

/// Index file growth unit (16 MiB)
pub const FILE_SIZE_IDX: u64 = 4096 * 4096;

/// Transaction file growth unit (4 KiB)
pub const FILE_SIZE_TX: u64 = 4096;

/// General purpose growth unit (2 MiB)
pub const FILE_SIZE_DEFAULT: u64 = 4096 * 512;

/// Ceiling used by the builder when none is given, in growth units
pub const DEFAULT_CEILING_UNITS: u64 = 16;

/// How a store is backed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackingMode {
    /// Positional reads and writes on a plain file
    #[default]
    Plain,

    /// Reads and writes through a shared memory mapping of the file
    Mapped,
}

/// Configuration for a single store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store name: the path of the backing file
    pub path: PathBuf,

    /// Growth granularity; the file size is always a multiple of it
    pub unit_size: u64,

    /// Hard size ceiling, a multiple of `unit_size`
    pub max_size: u64,

    /// Plain file or memory mapped
    pub mode: BackingMode,
}

impl StoreConfig {
    /// Create a fully specified config
    pub fn new(path: impl Into<PathBuf>, unit_size: u64, max_size: u64, mode: BackingMode) -> Self {
        Self {
            path: path.into(),
            unit_size,
            max_size,
            mode,
        }
    }

    /// Create a new config builder for the store at `path`
    pub fn builder(path: impl Into<PathBuf>) -> StoreConfigBuilder {
        StoreConfigBuilder {
            path: path.into(),
            unit_size: FILE_SIZE_DEFAULT,
            max_size: None,
            mode: BackingMode::Plain,
        }
    }

    /// Store name (backing file path)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the size invariants the backends rely on
    pub fn validate(&self) -> Result<()> {
        if self.unit_size == 0 {
            return Err(StrataError::Config("unit size must be non-zero".to_string()));
        }
        if self.max_size < self.unit_size || self.max_size % self.unit_size != 0 {
            return Err(StrataError::Config(format!(
                "max size {} must be a positive multiple of unit size {}",
                self.max_size, self.unit_size
            )));
        }
        if self.path.as_os_str().is_empty() {
            return Err(StrataError::Config("store path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for StoreConfig
pub struct StoreConfigBuilder {
    path: PathBuf,
    unit_size: u64,
    max_size: Option<u64>,
    mode: BackingMode,
}

impl StoreConfigBuilder {
    /// Set the growth unit (in bytes)
    pub fn unit_size(mut self, size: u64) -> Self {
        self.unit_size = size;
        self
    }

    /// Set the size ceiling (in bytes)
    pub fn max_size(mut self, size: u64) -> Self {
        self.max_size = Some(size);
        self
    }

    /// Set the size ceiling as a number of growth units (of the unit size set so far)
    pub fn max_units(mut self, units: u64) -> Self {
        self.max_size = Some(self.unit_size.saturating_mul(units));
        self
    }

    /// Set the backing mode
    pub fn mode(mut self, mode: BackingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build(self) -> StoreConfig {
        let max_size = self
            .max_size
            .unwrap_or_else(|| self.unit_size.saturating_mul(DEFAULT_CEILING_UNITS));

        StoreConfig {
            path: self.path,
            unit_size: self.unit_size,
            max_size,
            mode: self.mode,
        }
    }
}
