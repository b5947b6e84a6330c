//! Text metrics for the in-memory document.
//!
//! There is no font stack behind [`SvgDocument`](crate::SvgDocument): line heights are
//! derived from the font size and horizontal advances come from a [`TextMeasurer`].

/// Part of a line box above the baseline, in ems.
pub const ASCENT: f64 = 0.9;
/// Part of a line box below the baseline, in ems.
pub const DESCENT: f64 = 0.3;

/// Horizontal text measurement.
#[cfg_attr(test, mockall::automock)]
pub trait TextMeasurer {
    /// Advance width of `text` rendered at `font_size` pixels.
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

impl<F> TextMeasurer for F
where
    F: Fn(&str, f64) -> f64,
{
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        self(text, font_size)
    }
}

/// Options for text metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureConfig {
    /// Font size used when no `font-size` is set on the element or its ancestors
    pub font_size: f64,
    /// Advance of a single character as a fraction of the font size
    pub advance_ratio: f64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            advance_ratio: 0.6,
        }
    }
}

/// Monospace approximation: every character advances by the same amount.
#[derive(Debug, Clone, Copy)]
pub struct AdvanceMeasurer {
    ratio: f64,
}

impl AdvanceMeasurer {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }
}

impl Default for AdvanceMeasurer {
    fn default() -> Self {
        Self::new(MeasureConfig::default().advance_ratio)
    }
}

impl TextMeasurer for AdvanceMeasurer {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.ratio
    }
}
