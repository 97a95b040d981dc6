//! SkipList implementation
//!
//! Probabilistic ordered set over byte-string keys, built entirely on
//! [`Arena`] handles.

use std::fmt;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::arena::{Arena, NodeId};

/// Exclusive upper bound of the random draw behind `pick_height`
pub const HEIGHT_DRAW_BOUND: u32 = 39_751;

/// Tallest node `pick_height` can produce: 39_750 has at most 15 trailing ones
pub const MAX_HEIGHT: usize = 16;

/// Ordered set of distinct byte-string keys
///
/// Level 0 links every key in strictly increasing byte order. A node present
/// at level `i` is present at every level below it. The sentinel owns an
/// empty key, which never matches a real key, and anchors every level.
pub struct SkipList {
    arena: Arena,
    sentinel: NodeId,
    /// Predecessor per level, refilled on every descent; grown, never shrunk
    stack: Vec<NodeId>,
    len: usize,
    rng: StdRng,
}

impl SkipList {
    /// Create an empty list seeded from OS entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty list with deterministic node heights
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut arena = Arena::new();
        let sentinel = arena.allocate(Bytes::new(), 1);

        Self {
            arena,
            sentinel,
            stack: vec![NodeId::NULL; 1],
            len: 0,
            rng,
        }
    }

    /// Number of keys currently linked
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the highest level in use (0 for an empty list)
    pub fn height(&self) -> usize {
        self.arena.node(self.sentinel).height()
    }

    /// Nodes ever allocated for keys, including removed ones
    pub fn allocated_nodes(&self) -> usize {
        self.arena.len() - 1
    }

    /// Walk level 0 in key order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            arena: &self.arena,
            current: self.sentinel,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `key` is a member
    pub fn find(&self, key: &[u8]) -> bool {
        let prev = self.find_prev(key);
        self.successor_matches(prev, 0, key)
    }

    /// Collect keys from `start` through `end` along level 0
    ///
    /// - `start` absent: `(false, [])`, the scan never starts late.
    /// - `end` reached: `(true, keys)` with both ends included.
    /// - chain exhausted before `end`: `(false, keys)` with everything
    ///   collected from `start` onward.
    pub fn range_find(&self, start: &[u8], end: &[u8]) -> (bool, Vec<Bytes>) {
        let mut found = Vec::new();
        let mut n = self.find_prev(start);

        if !self.successor_matches(n, 0, start) {
            return (false, found);
        }

        loop {
            let next = self.arena.node(n).next[0];
            if !self.arena.is_live(next) {
                return (false, found);
            }

            let key = &self.arena.node(next).key;
            found.push(key.clone());
            if key.as_ref() == end {
                return (true, found);
            }

            n = next;
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `key`; false if it is already present or empty
    pub fn insert(&mut self, key: &[u8]) -> bool {
        if !self.locate(key) {
            return false;
        }

        let height = self.pick_height();
        self.link(key, height);
        true
    }

    /// Unlink `key` from every level it occupies; false if it was absent
    ///
    /// The arena slot stays allocated.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let mut removed = false;
        let mut n = self.sentinel;

        for level in (0..=self.height()).rev() {
            n = self.advance(n, level, key);
            if !self.successor_matches(n, level, key) {
                continue;
            }

            let target = self.arena.node(n).next[level];
            let after = self.arena.node(target).next[level];
            self.arena.node_mut(n).next[level] = after;

            // Only the level just unlinked is inspected; descending order
            // lets a multi-level collapse trim one level per step.
            if n == self.sentinel && level > 0 && level == self.height() && !self.arena.is_live(after) {
                self.arena.node_mut(self.sentinel).next.truncate(level);
                tracing::trace!(height = level - 1, "skip list trimmed");
            }

            removed = true;
        }

        if removed {
            self.len -= 1;
        }

        removed
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Follow `level` from `n` while the next key sorts before `key`
    fn advance(&self, mut n: NodeId, level: usize, key: &[u8]) -> NodeId {
        loop {
            let next = self.arena.node(n).next[level];
            if self.arena.is_live(next) && self.arena.key(next) < key {
                n = next;
            } else {
                return n;
            }
        }
    }

    fn successor_matches(&self, n: NodeId, level: usize, key: &[u8]) -> bool {
        let next = self.arena.node(n).next[level];
        self.arena.is_live(next) && self.arena.key(next) == key
    }

    /// Level-0 predecessor of `key`
    fn find_prev(&self, key: &[u8]) -> NodeId {
        let mut n = self.sentinel;
        for level in (0..=self.height()).rev() {
            n = self.advance(n, level, key);
        }
        n
    }

    /// Descend recording predecessors in `stack`; false on an exact match
    fn locate(&mut self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }

        let mut n = self.sentinel;
        for level in (0..=self.height()).rev() {
            n = self.advance(n, level, key);
            if self.successor_matches(n, level, key) {
                return false;
            }
            self.stack[level] = n;
        }
        true
    }

    /// Allocate and splice a node of `height` links using the predecessors
    /// left in `stack` by `locate`
    fn link(&mut self, key: &[u8], height: usize) {
        let id = self.arena.allocate(Bytes::copy_from_slice(key), height);
        let node_height = self.arena.node(id).height();

        while self.height() < node_height {
            self.arena.node_mut(self.sentinel).next.push(NodeId::NULL);
            let level = self.height();
            if self.stack.len() <= level {
                self.stack.resize(level + 1, NodeId::NULL);
            }
            self.stack[level] = self.sentinel;
            tracing::trace!(height = level, "skip list grew");
        }

        for level in 0..=node_height {
            let pred = self.stack[level];
            let old = self.arena.node(pred).next[level];
            self.arena.node_mut(id).next[level] = old;
            self.arena.node_mut(pred).next[level] = id;
        }

        self.len += 1;
    }

    /// Number of links for a new node: consecutive low one-bits of a bounded
    /// draw, plus one. P(height >= n) is about 2^-(n-1).
    fn pick_height(&mut self) -> usize {
        let draw: u32 = self.rng.gen_range(0..HEIGHT_DRAW_BOUND);
        draw.trailing_ones() as usize + 1
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SkipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len)
            .field("height", &self.height())
            .field("allocated_nodes", &self.allocated_nodes())
            .finish()
    }
}

impl<'a> IntoIterator for &'a SkipList {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Level-0 iterator over a [`SkipList`]
pub struct Iter<'a> {
    arena: &'a Arena,
    current: NodeId,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let arena = self.arena;
        let next = arena.node(self.current).next[0];
        if !arena.is_live(next) {
            return None;
        }

        self.current = next;
        Some(arena.key(next))
    }
}
