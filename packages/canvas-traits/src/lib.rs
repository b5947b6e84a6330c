//! Shared traits and types for the retained SVG canvas.
//!
//! The canvas core never talks to a concrete graphics document. Everything it does to
//! the visible tree goes through [`HostSurface`], which an embedder implements on top
//! of whatever live vector document it has (a browser SVG tree, an in-memory document
//! such as `canvas-svg`, a test double...).

pub mod host;
pub mod ns;

pub use host::{HostHandle, HostSurface, Subscription, SubscriptionId};

/// Geometry types used across the boundary.
pub use kurbo::{Affine, Point, Rect, Size, Vec2};
