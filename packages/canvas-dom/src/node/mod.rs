mod attributes;

pub use attributes::{Attribute, Attributes};

use bitflags::bitflags;
use canvas_traits::HostHandle;

use crate::descriptor::Content;

/// Stable handle of a node inside its [`GraphicsContext`](crate::GraphicsContext).
pub type NodeId = usize;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// The next `replace` of this node skips host-order preservation
        const INVALIDATED = 0b0000_0001;
        /// Part of the hidden measurement subtree
        const SHADOW      = 0b0000_0010;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A primitive element (`rect`, `g`, `text`, ...)
    Element(String),
    /// A bare text unit
    RawText,
}

impl NodeKind {
    pub fn tag(&self) -> Option<&str> {
        match self {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::RawText => None,
        }
    }
}

/// A single primitive of the retained tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub attrs: Attributes,
    /// Back-reference only. The parent owns this node through `children` or `composites`.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Roots of text blocks created under this node. They manage their own subtree.
    pub composites: Vec<NodeId>,
    pub content: Content,
    /// Sibling this node was inserted before
    pub insert_before: Option<NodeId>,
    pub flags: NodeFlags,

    pub(crate) host: Option<HostHandle>,
    pub(crate) text_block: Option<usize>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        kind: NodeKind,
        attrs: Attributes,
        parent: Option<NodeId>,
        content: Content,
        insert_before: Option<NodeId>,
    ) -> Self {
        Self {
            id,
            kind,
            attrs,
            parent,
            children: Vec::new(),
            composites: Vec::new(),
            content,
            insert_before,
            flags: NodeFlags::empty(),
            host: None,
            text_block: None,
        }
    }

    /// The live host element, once created.
    pub fn host(&self) -> Option<HostHandle> {
        self.host
    }

    pub fn tag(&self) -> Option<&str> {
        self.kind.tag()
    }

    pub fn is_text_block(&self) -> bool {
        self.text_block.is_some()
    }

    pub fn is_invalidated(&self) -> bool {
        self.flags.contains(NodeFlags::INVALIDATED)
    }

    pub(crate) fn owned_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().chain(self.composites.iter()).copied()
    }
}
