//! Node IDs for expression tree nodes.
//!
//! Each parsed node gets a unique `NodeId` so later passes can refer to a
//! particular node (for example a recognized call site) without holding a
//! borrow into the tree.

/// Unique identifier for an expression node within a program.
///
/// NodeIds are local to one parsed program. Nodes built by rewriting carry
/// [`NodeId::SYNTHETIC`] unless they take over the identity of the node
/// they replace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, salsa::Update)]
pub struct NodeId(u32);

impl NodeId {
    /// Identity shared by all nodes that were not produced by the parser.
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);

    /// Get the raw value of this NodeId.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_synthetic(self) -> bool {
        self.0 == u32::MAX
    }

    /// Create a NodeId from a raw value.
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_synthetic() {
            write!(f, "#synthetic")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Generator for sequential node IDs.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}
