//! Tests for MappedBackend
//!
//! These tests verify:
//! - Reads and writes through the mapping
//! - The high-water mark bounds reads
//! - Writes never reach past the extent mapped at open
//! - Mapped bytes are visible through the plain file after close

use std::path::PathBuf;

use strata::config::StoreConfig;
use strata::{open_store, BackingMode, FileBackend, MappedBackend, Store, StrataError};
use tempfile::TempDir;

const UNIT: u64 = 64 * 1024;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("mapped.db");
    (temp_dir, path)
}

fn config(path: &PathBuf, mode: BackingMode) -> StoreConfig {
    StoreConfig::builder(path)
        .unit_size(UNIT)
        .max_units(16)
        .mode(mode)
        .build()
}

fn open(path: &PathBuf) -> MappedBackend {
    MappedBackend::open(&config(path, BackingMode::Mapped)).unwrap()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_maps_current_extent() {
    let (_temp, path) = setup_temp_store();

    let store = open(&path);

    assert_eq!(store.mapped_len(), UNIT);
    assert_eq!(store.allocated_size(), UNIT);
    assert_eq!(store.high_water_mark(), 0);
    assert_eq!(store.file_backend().path(), path.as_path());
}

#[test]
fn test_open_store_selects_mapped_backend() {
    let (_temp, path) = setup_temp_store();
    let mut store = open_store(&config(&path, BackingMode::Mapped)).unwrap();

    store.write_at(b"mapped", 0).unwrap();

    // Mapped stores refuse reads past the mark
    let mut buf = [0u8; 8];
    assert!(matches!(
        store.read_at(&mut buf, 0),
        Err(StrataError::ReadOutOfRange { .. })
    ));
    store.close().unwrap();
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_write_then_read() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    assert_eq!(store.write_at(b"hello mapped", 10).unwrap(), 12);

    let mut buf = [0u8; 12];
    assert_eq!(store.read_at(&mut buf, 10).unwrap(), 12);
    assert_eq!(&buf, b"hello mapped");
    assert_eq!(store.high_water_mark(), 22);
}

#[test]
fn test_many_small_writes() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    for i in 0..1024u64 {
        let record = [(i % 251) as u8; 14];
        store.write_at(&record, i * 14).unwrap();
    }

    assert_eq!(store.high_water_mark(), 14 * 1024);
    for i in [0u64, 17, 511, 1023] {
        let mut buf = [0u8; 14];
        store.read_at(&mut buf, i * 14).unwrap();
        assert_eq!(buf, [(i % 251) as u8; 14]);
    }
}

#[test]
fn test_zero_length_buffers_are_rejected() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    assert!(matches!(store.write_at(&[], 0), Err(StrataError::ZeroLengthBuffer)));
    assert!(matches!(store.read_at(&mut [], 0), Err(StrataError::ZeroLengthBuffer)));
}

#[test]
fn test_read_up_to_mark_succeeds() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(b"0123456789", 0).unwrap();

    let mut buf = [0u8; 10];
    store.read_at(&mut buf, 0).unwrap();
    assert_eq!(&buf, b"0123456789");
}

#[test]
fn test_read_past_mark_fails() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(b"0123456789", 0).unwrap();

    let mut buf = [0u8; 11];
    let result = store.read_at(&mut buf, 0);

    assert!(matches!(
        result,
        Err(StrataError::ReadOutOfRange { offset: 0, len: 11, high_water_mark: 10 })
    ));
}

#[test]
fn test_write_outside_mapping_fails() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(b"head", 0).unwrap();

    let result = store.write_at(&[1u8; 16], UNIT - 8);

    assert!(matches!(
        result,
        Err(StrataError::OutsideMapping { end, mapped }) if end == UNIT + 8 && mapped == UNIT
    ));
    assert_eq!(store.high_water_mark(), 4);
    assert_eq!(store.allocated_size(), UNIT);
}

#[test]
fn test_mapped_writes_never_grow_file() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    for i in 0..UNIT / 4096 {
        store.write_at(&[i as u8; 4096], i * 4096).unwrap();
    }
    assert!(matches!(
        store.write_at(&[1u8], UNIT),
        Err(StrataError::OutsideMapping { .. })
    ));

    assert_eq!(store.allocated_size(), UNIT);
    assert_eq!(store.mapped_len(), UNIT);
    store.close().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), UNIT);
}

#[test]
fn test_read_persisted_ignores_mark() {
    let (_temp, path) = setup_temp_store();
    {
        let mut store = open(&path);
        store.write_at(b"durable", 0).unwrap();
        store.close().unwrap();
    }

    let store = open(&path);
    let mut buf = [0u8; 7];
    store.read_persisted(&mut buf, 0).unwrap();

    assert_eq!(&buf, b"durable");
    assert_eq!(store.high_water_mark(), 0);
    assert!(matches!(
        store.read_persisted(&mut buf, UNIT - 3),
        Err(StrataError::OutsideMapping { .. })
    ));
}

#[test]
fn test_ceiling_is_checked_before_mapping() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    let result = store.write_at(&[1u8; 16], 16 * UNIT);

    assert!(matches!(result, Err(StrataError::SizeLimitExceeded { .. })));
}

#[test]
fn test_write_filling_mapping_exactly() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    store.write_at(&[9u8; 8], UNIT - 8).unwrap();

    assert_eq!(store.high_water_mark(), UNIT);
    assert_eq!(store.allocated_size(), UNIT);
}

// =============================================================================
// Sync Tests
// =============================================================================

#[test]
fn test_sync_ranges() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(&[4u8; 4096], 0).unwrap();

    store.sync(0, 0).unwrap();
    store.sync(0, 4096).unwrap();
    store.sync(100, 48).unwrap();
}

#[test]
fn test_sync_outside_mapping_is_invalid_range() {
    let (_temp, path) = setup_temp_store();
    let store = open(&path);

    let result = store.sync(UNIT - 10, 20);

    assert!(matches!(
        result,
        Err(StrataError::InvalidRange { offset, len: 20 }) if offset == UNIT - 10
    ));
}

// =============================================================================
// Close/Reopen Tests
// =============================================================================

#[test]
fn test_operations_after_close_fail() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(b"x", 0).unwrap();

    store.close().unwrap();

    assert_eq!(store.mapped_len(), 0);
    assert!(store.file_backend().is_closed());
    assert!(matches!(store.write_at(b"x", 0), Err(StrataError::Closed)));
    assert!(matches!(store.read_at(&mut [0u8; 1], 0), Err(StrataError::Closed)));
    assert!(matches!(store.sync(0, 0), Err(StrataError::Closed)));
    store.close().unwrap();
}

#[test]
fn test_mapped_writes_visible_through_plain_reopen() {
    let (_temp, path) = setup_temp_store();
    {
        let mut store = open(&path);
        store.write_at(b"through the map", 300).unwrap();
        store.close().unwrap();
    }

    let store = FileBackend::open(&config(&path, BackingMode::Plain)).unwrap();
    let mut buf = [0u8; 15];
    store.read_at(&mut buf, 300).unwrap();

    assert_eq!(&buf, b"through the map");
}

#[test]
fn test_reopened_mapping_needs_restored_mark() {
    let (_temp, path) = setup_temp_store();
    {
        let mut store = open(&path);
        store.write_at(b"abcdef", 0).unwrap();
        store.close().unwrap();
    }

    let mut store = open(&path);
    let mut buf = [0u8; 6];
    assert!(matches!(
        store.read_at(&mut buf, 0),
        Err(StrataError::ReadOutOfRange { .. })
    ));

    store.restore_high_water_mark(6).unwrap();
    store.read_at(&mut buf, 0).unwrap();
    assert_eq!(&buf, b"abcdef");
}

#[test]
fn test_reopen_maps_grown_file() {
    let (_temp, path) = setup_temp_store();
    {
        let mut store = FileBackend::open(&config(&path, BackingMode::Plain)).unwrap();
        store.write_at(b"grown", UNIT + 1).unwrap();
        store.close().unwrap();
    }

    let mut store = open(&path);

    assert_eq!(store.mapped_len(), 2 * UNIT);
    store.write_at(b"late", 2 * UNIT - 4).unwrap();
    store.restore_high_water_mark(2 * UNIT).unwrap();
    let mut buf = [0u8; 5];
    store.read_at(&mut buf, UNIT + 1).unwrap();
    assert_eq!(&buf, b"grown");
}

#[test]
fn test_restore_beyond_mapping_fails() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    let result = store.restore_high_water_mark(UNIT + 1);

    assert!(matches!(result, Err(StrataError::OutsideMapping { .. })));
}
