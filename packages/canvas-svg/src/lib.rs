//! A headless SVG document for the retained canvas.
//!
//! [`SvgDocument`] implements [`canvas_traits::HostSurface`] entirely in memory. It
//! computes bounding boxes from element attributes, measures text through a pluggable
//! [`TextMeasurer`], tracks size observations and serializes any subtree back to SVG
//! markup. It is what the canvas renders into when there is no browser around: server
//! side rendering, snapshots and tests.

mod document;
mod error;
pub mod geometry;
pub mod measure;
mod serialize;

pub use document::SvgDocument;
pub use error::ParseError;
pub use measure::{AdvanceMeasurer, MeasureConfig, TextMeasurer};
