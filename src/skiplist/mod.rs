//! SkipList Module
//!
//! In-memory ordered index over byte-string keys.
//!
//! ## Responsibilities
//! - Ordered set semantics: no duplicates, no upsert
//! - Expected O(log n) find / insert / remove via randomized heights
//! - Range scans anchored on an exact start key
//!
//! ## Memory Model
//! Nodes live in an [`Arena`] and link to each other through [`NodeId`]
//! handles instead of references. Growing the arena's storage never
//! invalidates a link, and the links are plain integers.
//!
//! Removed nodes are unlinked but their arena slots are never reclaimed;
//! memory grows with the total number of inserts, not the live count.
//!
//! ## Concurrency
//! None. A `SkipList` is owned by one writer; callers that share one across
//! threads wrap it in their own lock.

mod arena;
mod list;

pub use arena::{Arena, Node, NodeId};
pub use list::{Iter, SkipList, HEIGHT_DRAW_BOUND, MAX_HEIGHT};
