use crate::node::NodeId;

/// Errors returned by canvas mutations.
///
/// Blank text is not an error (text factories return `Ok(None)`), and geometry that
/// cannot be measured yet only defers layout.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A descriptor in a list has no `type`. `path` holds the list indices leading to it.
    #[error("Descriptor at {path:?} has no type")]
    MissingType { path: Vec<usize> },

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not a text block")]
    NotATextBlock(NodeId),

    #[error("The canvas root cannot be removed or replaced")]
    RootNode,

    #[error("Node {0} cannot replace one of its own ancestors")]
    ReplaceWithDescendant(NodeId),

    #[error("Node {0} cannot replace one of its own descendants")]
    ReplaceWithAncestor(NodeId),

    #[error("Content not supported by {0} elements")]
    UnsupportedContent(&'static str),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
