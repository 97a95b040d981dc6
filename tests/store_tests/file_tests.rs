//! Tests for FileBackend
//!
//! These tests verify:
//! - Preallocation and geometric growth in whole units
//! - The size ceiling and the high-water mark
//! - Positional reads and overwrites
//! - Ranged and full sync
//! - Close semantics and reopening without truncation

use std::path::PathBuf;

use strata::config::StoreConfig;
use strata::{open_store, BackingMode, FileBackend, Store, StrataError};
use tempfile::TempDir;

const UNIT: u64 = 4096;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");
    (temp_dir, path)
}

fn config(path: &PathBuf) -> StoreConfig {
    StoreConfig::builder(path)
        .unit_size(UNIT)
        .max_units(16)
        .mode(BackingMode::Plain)
        .build()
}

fn open(path: &PathBuf) -> FileBackend {
    FileBackend::open(&config(path)).unwrap()
}

fn read_vec(store: &dyn Store, offset: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    store.read_at(&mut buf, offset).unwrap();
    buf
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_preallocates_one_unit() {
    let (_temp, path) = setup_temp_store();

    let store = open(&path);

    assert_eq!(store.allocated_size(), UNIT);
    assert_eq!(store.high_water_mark(), 0);
    assert_eq!(store.max_size(), 16 * UNIT);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), UNIT);
}

#[test]
fn test_open_rejects_invalid_config() {
    let (_temp, path) = setup_temp_store();
    let config = StoreConfig::new(&path, UNIT, UNIT + 1, BackingMode::Plain);

    let result = FileBackend::open(&config);

    assert!(matches!(result, Err(StrataError::Config(_))));
    assert!(!path.exists());
}

#[test]
fn test_open_store_selects_plain_backend() {
    let (_temp, path) = setup_temp_store();

    let mut store = open_store(&config(&path)).unwrap();
    store.write_at(b"plain", 0).unwrap();

    assert_eq!(store.high_water_mark(), 5);
    // Plain stores read past the mark from the file
    assert_eq!(read_vec(store.as_ref(), 0, 8), b"plain\0\0\0");
    store.close().unwrap();
}

// =============================================================================
// Growth Tests
// =============================================================================

#[test]
fn test_write_within_first_unit_does_not_grow() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    assert_eq!(store.write_at(&[1u8; 16], 0).unwrap(), 16);

    assert_eq!(store.allocated_size(), UNIT);
    assert_eq!(store.high_water_mark(), 16);
}

#[test]
fn test_write_across_unit_boundary_doubles() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    store.write_at(&[1u8; 16], 0).unwrap();
    store.write_at(&[2u8; 16], 4090).unwrap();

    assert_eq!(store.allocated_size(), 8192);
    assert_eq!(store.high_water_mark(), 4106);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 8192);
    assert_eq!(read_vec(&store, 4090, 16), vec![2u8; 16]);
}

#[test]
fn test_sequential_appends_grow_geometrically() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    let record = [0xabu8; 14];

    let mut sizes = vec![store.allocated_size()];
    for i in 0..1024u64 {
        store.write_at(&record, i * 14).unwrap();
        if *sizes.last().unwrap() != store.allocated_size() {
            sizes.push(store.allocated_size());
        }
    }

    assert_eq!(store.high_water_mark(), 14 * 1024);
    assert_eq!(sizes, vec![4096, 8192, 16384]);
    assert_eq!(store.allocated_size() % UNIT, 0);
    assert!(store.high_water_mark() <= store.allocated_size());
    assert_eq!(read_vec(&store, 14 * 1023, 14), record.to_vec());
}

#[test]
fn test_growth_is_clamped_to_ceiling() {
    let (_temp, path) = setup_temp_store();
    let config = StoreConfig::builder(&path).unit_size(UNIT).max_units(12).build();
    let mut store = FileBackend::open(&config).unwrap();

    store.write_at(b"tail", 11 * UNIT).unwrap();

    assert_eq!(store.allocated_size(), 12 * UNIT);
    assert_eq!(store.high_water_mark(), 11 * UNIT + 4);
}

#[test]
fn test_write_past_ceiling_fails_without_side_effects() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(&[1u8; 16], 0).unwrap();

    let result = store.write_at(&[9u8; 16], 16 * UNIT - 8);

    assert!(matches!(
        result,
        Err(StrataError::SizeLimitExceeded { required, max_size })
            if required == 16 * UNIT + 8 && max_size == 16 * UNIT
    ));
    assert_eq!(store.high_water_mark(), 16);
    assert_eq!(store.allocated_size(), UNIT);
}

#[test]
fn test_write_ending_exactly_at_ceiling_succeeds() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    store.write_at(&[7u8; 8], 16 * UNIT - 8).unwrap();

    assert_eq!(store.allocated_size(), 16 * UNIT);
    assert_eq!(store.high_water_mark(), 16 * UNIT);
}

#[test]
fn test_write_offset_overflow_is_size_limit() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    let result = store.write_at(&[1u8; 4], u64::MAX - 1);

    assert!(matches!(result, Err(StrataError::SizeLimitExceeded { .. })));
}

// =============================================================================
// Read/Write Tests
// =============================================================================

#[test]
fn test_overwrite_below_mark_keeps_mark() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    store.write_at(b"0123456789", 0).unwrap();
    store.write_at(b"abc", 2).unwrap();

    assert_eq!(store.high_water_mark(), 10);
    assert_eq!(read_vec(&store, 0, 10), b"01abc56789");
}

#[test]
fn test_sparse_write_leaves_zeroed_gap() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    store.write_at(b"end", 100).unwrap();

    assert_eq!(store.high_water_mark(), 103);
    assert_eq!(read_vec(&store, 0, 100), vec![0u8; 100]);
}

#[test]
fn test_zero_length_buffers_are_rejected() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    assert!(matches!(store.write_at(&[], 0), Err(StrataError::ZeroLengthBuffer)));
    assert!(matches!(store.read_at(&mut [], 0), Err(StrataError::ZeroLengthBuffer)));
    assert_eq!(store.high_water_mark(), 0);
}

#[test]
fn test_read_past_end_of_file_is_short() {
    let (_temp, path) = setup_temp_store();
    let store = open(&path);
    let mut buf = [0u8; 32];

    let result = store.read_at(&mut buf, UNIT - 16);

    assert!(matches!(
        result,
        Err(StrataError::ShortTransfer { expected: 32, actual: 16 })
    ));
}

// =============================================================================
// Sync Tests
// =============================================================================

#[test]
fn test_full_and_ranged_sync() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(&[5u8; 256], 0).unwrap();

    store.sync(0, 0).unwrap();
    store.sync(0, 256).unwrap();
    store.sync(100, 10).unwrap();
}

// =============================================================================
// Close/Reopen Tests
// =============================================================================

#[test]
fn test_operations_after_close_fail() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);
    store.write_at(b"data", 0).unwrap();

    store.close().unwrap();

    assert!(store.is_closed());
    assert!(matches!(store.write_at(b"x", 0), Err(StrataError::Closed)));
    assert!(matches!(store.read_at(&mut [0u8; 1], 0), Err(StrataError::Closed)));
    assert!(matches!(store.sync(0, 0), Err(StrataError::Closed)));
}

#[test]
fn test_close_is_idempotent() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    store.close().unwrap();
    store.close().unwrap();
}

#[test]
fn test_reopen_preserves_bytes_and_size() {
    let (_temp, path) = setup_temp_store();
    {
        let mut store = open(&path);
        store.write_at(b"persisted", 0).unwrap();
        store.write_at(b"far", 5000).unwrap();
        store.sync(0, 0).unwrap();
        store.close().unwrap();
    }

    let store = open(&path);

    assert_eq!(store.allocated_size(), 8192);
    assert_eq!(store.high_water_mark(), 0);
    assert_eq!(read_vec(&store, 0, 9), b"persisted");
    assert_eq!(read_vec(&store, 5000, 3), b"far");
}

#[test]
fn test_reopen_rounds_partial_unit_up() {
    let (_temp, path) = setup_temp_store();
    std::fs::write(&path, vec![3u8; 5000]).unwrap();

    let store = open(&path);

    assert_eq!(store.allocated_size(), 8192);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 8192);
    assert_eq!(read_vec(&store, 4990, 10), vec![3u8; 10]);
}

#[test]
fn test_reopen_beyond_ceiling_fails() {
    let (_temp, path) = setup_temp_store();
    std::fs::write(&path, vec![0u8; 17 * UNIT as usize]).unwrap();

    let result = FileBackend::open(&config(&path));

    assert!(matches!(result, Err(StrataError::SizeLimitExceeded { .. })));
}

#[test]
fn test_restore_high_water_mark() {
    let (_temp, path) = setup_temp_store();
    let mut store = open(&path);

    store.restore_high_water_mark(1000).unwrap();
    assert_eq!(store.high_water_mark(), 1000);

    let result = store.restore_high_water_mark(UNIT + 1);
    assert!(matches!(result, Err(StrataError::Corruption(_))));
    assert_eq!(store.high_water_mark(), 1000);
}
