//! A retained-mode scene graph reflected onto an SVG host.
//!
//! [`GraphicsContext`] owns a tree of primitives ([`Node`]s) and mirrors every
//! mutation onto a [`HostSurface`](canvas_traits::HostSurface) as it happens. On top of
//! plain shapes it provides text blocks: multi-line text that is word-wrapped by
//! measuring on the host, aligned by anchor, optionally backed by a padded background
//! and clipped or masked by a shape, and re-positioned whenever the host reports that
//! the rendered text changed size (see [`GraphicsContext::poll`]).
//!
//! Content arrives as typed [`Descriptor`]s or as `{type, attributes, content}` JSON
//! ([`RawDescriptor`]).
//!
//! ## Feature flags
//!  - `default`: Enables the features listed below.
//!  - `tracing`: Enables tracing support.

mod config;
/// The context and its factories.
mod context;
pub mod descriptor;
mod error;
mod mutator;
/// The nodes themselves, and their data.
pub mod node;
pub mod text;

pub use config::{CanvasConfig, SizingMode};
pub use context::{GraphicsContext, TEXT_PADDING};
pub use descriptor::{
    Anchor, ClipShape, Content, ContentItem, Descriptor, ElementKind, HorizontalAnchor,
    LineRecord, RawDescriptor, TextAreaOptions, VerticalAnchor,
};
pub use error::{Error, Result};
pub use node::{Attribute, Attributes, Node, NodeFlags, NodeId, NodeKind};
pub use text::{Fragment, TextBlock, TextBlockState, WrappedLine, parse_links, wrap_line};
