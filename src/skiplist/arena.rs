//! Node arena
//!
//! Append-only owner of skip-list nodes, addressed by position.

use bytes::Bytes;

/// Handle to a node inside an [`Arena`]; `NodeId::NULL` means "no node"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeId(usize);

impl NodeId {
    /// The null link
    pub const NULL: NodeId = NodeId(0);

    /// Raw position of this handle
    pub fn as_usize(self) -> usize {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// A key plus one forward link per level (`next[0]` is the bottom level)
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub key: Bytes,
    pub next: Vec<NodeId>,
}

impl Node {
    fn new(key: Bytes, height: usize) -> Self {
        Self {
            key,
            next: vec![NodeId::NULL; height],
        }
    }

    /// Highest level index this node occupies
    pub fn height(&self) -> usize {
        self.next.len().saturating_sub(1)
    }
}

/// Growable owning store of nodes
///
/// Slot 0 is a permanent placeholder so that every issued id is nonzero.
/// Slots are never freed or reused.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Append a node with `height` null links and return its id
    ///
    /// Ids are strictly increasing across calls.
    pub fn allocate(&mut self, key: Bytes, height: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(key, height));
        id
    }

    /// Resolve a handle.
    ///
    /// Panics on an id this arena never issued; that is a caller bug, not a
    /// recoverable condition.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn key(&self, id: NodeId) -> &[u8] {
        &self.nodes[id.0].key
    }

    /// False for the null id and for any node with an empty key (the sentinel)
    pub fn is_live(&self, id: NodeId) -> bool {
        !id.is_null() && !self.key(id).is_empty()
    }

    /// Number of slots handed out, excluding the placeholder
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
