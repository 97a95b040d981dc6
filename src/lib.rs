//! # strata
//!
//! Storage substrate of an embedded, single-node data engine:
//! - An arena-addressed skip list: an ordered set of byte-string keys
//! - Growable file stores with a size ceiling and ranged durability
//! - A memory-mapped store behind the same capability
//! - Durable store headers, checksums, codecs and transaction stamps
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌──────────────────────┐        ┌──────────────────────────────┐
//!   │  Transaction stamps  │        │        Store header          │
//!   │   (TxLog, Mutex)     │        │      (HeaderManager)         │
//!   └──────────┬───────────┘        └──────────────┬───────────────┘
//!              │                                   │
//!              └──────────────┬────────────────────┘
//!                             ▼
//!                   ┌──────────────────┐
//!                   │    dyn Store     │
//!                   └───┬──────────┬───┘
//!                       ▼          ▼
//!              ┌─────────────┐ ┌───────────────┐
//!              │ FileBackend │ │ MappedBackend │
//!              └─────────────┘ └───────────────┘
//!
//!   ┌──────────────────────┐
//!   │      SkipList        │   sibling of the store half;
//!   │  (Arena + NodeId)    │   the two never call each other
//!   └──────────────────────┘
//! ```
//!
//! Nothing here locks internally. Each SkipList and each Store has a single
//! owner; sharing one across threads is the caller's job.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod skiplist;
pub mod store;
pub mod checksum;
pub mod codec;
pub mod txn;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreOp, StrataError};
pub use config::{BackingMode, StoreConfig};
pub use skiplist::SkipList;
pub use store::{open_store, FileBackend, MappedBackend, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
