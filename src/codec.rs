//! Compression codecs
//!
//! Interchangeable encoders with the round-trip guarantee
//! `decode(encode(x)) == x`.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use zstd::stream::{Decoder as ZstdDecoder, Encoder as ZstdEncoder};

use crate::error::{Result, StrataError};

/// A compression algorithm behind one signature
pub trait Codec: Send + Sync {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Short algorithm name for logs
    fn name(&self) -> &'static str;
}

/// Available codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Gzip,
    Lz4,
    Zstd,
}

/// Build a codec for `kind` at its default level
pub fn codec(kind: CodecKind) -> Box<dyn Codec> {
    match kind {
        CodecKind::Gzip => Box::new(Gzip::default()),
        CodecKind::Lz4 => Box::new(Lz4),
        CodecKind::Zstd => Box::new(Zstd::default()),
    }
}

fn codec_error(name: &str, err: impl std::fmt::Display) -> StrataError {
    StrataError::Codec(format!("{}: {}", name, err))
}

// =============================================================================
// Gzip
// =============================================================================

/// Gzip (DEFLATE) via flate2
#[derive(Debug, Clone, Copy)]
pub struct Gzip {
    level: Compression,
}

impl Gzip {
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl Default for Gzip {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Codec for Gzip {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(data).map_err(|e| codec_error("gzip", e))?;
        encoder.finish().map_err(|e| codec_error("gzip", e))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        GzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| codec_error("gzip", e))?;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "gzip"
    }
}

// =============================================================================
// LZ4
// =============================================================================

/// LZ4 block format with the uncompressed size prepended
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4;

impl Codec for Lz4 {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(data))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(data).map_err(|e| codec_error("lz4", e))
    }

    fn name(&self) -> &'static str {
        "lz4"
    }
}

// =============================================================================
// Zstd
// =============================================================================

/// Zstandard frames
#[derive(Debug, Clone, Copy)]
pub struct Zstd {
    level: i32,
}

impl Zstd {
    pub fn with_level(level: i32) -> Self {
        Self { level }
    }
}

impl Default for Zstd {
    fn default() -> Self {
        Self {
            level: zstd::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl Codec for Zstd {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder =
            ZstdEncoder::new(Vec::new(), self.level).map_err(|e| codec_error("zstd", e))?;
        encoder.write_all(data).map_err(|e| codec_error("zstd", e))?;
        encoder.finish().map_err(|e| codec_error("zstd", e))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        ZstdDecoder::new(data)
            .map_err(|e| codec_error("zstd", e))?
            .read_to_end(&mut out)
            .map_err(|e| codec_error("zstd", e))?;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "zstd"
    }
}
