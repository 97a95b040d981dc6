//! Platform I/O primitives
//!
//! Positional transfers, ranged flushes and flush-error classification. The
//! rest of the crate reaches the operating system only through here and
//! through `memmap2`.

use std::fs::File;
use std::io;

use crate::error::{StoreOp, StrataError};

// =============================================================================
// Positional Transfers
// =============================================================================

#[cfg(unix)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, buf, offset)
}

#[cfg(unix)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::write_at(file, buf, offset)
}

#[cfg(windows)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, buf, offset)
}

#[cfg(windows)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_write(file, buf, offset)
}

/// Read until `buf` is full or the file ends; returns bytes moved
pub(crate) fn read_full(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let mut done = 0;
    while done < buf.len() {
        match pread(file, &mut buf[done..], offset + done as u64) {
            Ok(0) => break,
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(done)
}

/// Write until `buf` is drained or the OS stops accepting bytes
pub(crate) fn write_full(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    let mut done = 0;
    while done < buf.len() {
        match pwrite(file, &buf[done..], offset + done as u64) {
            Ok(0) => break,
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(done)
}

// =============================================================================
// Ranged Flush
// =============================================================================

/// Flush only the pages covering `len` bytes at `offset`
#[cfg(target_os = "linux")]
pub(crate) fn sync_range(file: &File, offset: u64, len: u64) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let invalid = || io::Error::from(io::ErrorKind::InvalidInput);
    let offset = libc::off64_t::try_from(offset).map_err(|_| invalid())?;
    let len = libc::off64_t::try_from(len).map_err(|_| invalid())?;
    let flags = libc::SYNC_FILE_RANGE_WAIT_BEFORE
        | libc::SYNC_FILE_RANGE_WRITE
        | libc::SYNC_FILE_RANGE_WAIT_AFTER;

    // SAFETY: the descriptor is owned by `file`, which outlives the call.
    let rc = unsafe { libc::sync_file_range(file.as_raw_fd(), offset, len, flags) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Platforms without a ranged flush fall back to flushing the file's data
#[cfg(not(target_os = "linux"))]
pub(crate) fn sync_range(file: &File, _offset: u64, _len: u64) -> io::Result<()> {
    file.sync_data()
}

// =============================================================================
// Error Classification
// =============================================================================

enum FlushFault {
    InvalidRange,
    NoSuchRange,
}

#[cfg(unix)]
fn errno_fault(err: &io::Error) -> Option<FlushFault> {
    match err.raw_os_error() {
        Some(libc::EINVAL) => Some(FlushFault::InvalidRange),
        Some(libc::ENOMEM) | Some(libc::ENOENT) => Some(FlushFault::NoSuchRange),
        _ => None,
    }
}

#[cfg(not(unix))]
fn errno_fault(_err: &io::Error) -> Option<FlushFault> {
    None
}

/// Map a flush failure onto the explicit error kinds shared by every backend
pub(crate) fn flush_error(offset: u64, len: u64, err: io::Error) -> StrataError {
    if err.kind() == io::ErrorKind::WouldBlock {
        return StrataError::WouldBlock { op: StoreOp::Flush };
    }

    match errno_fault(&err) {
        Some(FlushFault::InvalidRange) => StrataError::InvalidRange { offset, len },
        Some(FlushFault::NoSuchRange) => StrataError::NoSuchRange { offset, len },
        None if err.kind() == io::ErrorKind::InvalidInput => StrataError::InvalidRange { offset, len },
        None => StrataError::platform(StoreOp::Flush, err),
    }
}
