use color::{AlphaColor, Srgb};
use serde::{Deserialize, Deserializer};

/// How the root `svg` element is sized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizingMode {
    /// `width`/`height` in pixels.
    #[default]
    Fixed,
    /// A `0 0 width height` viewBox, scaled to its container but never beyond the
    /// configured size.
    ViewBox,
}

impl SizingMode {
    /// Anything unrecognised falls back to [`SizingMode::Fixed`].
    pub fn parse_lossy(raw: Option<&str>) -> Self {
        match raw.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("viewbox") | Some("normalized") => SizingMode::ViewBox,
            _ => SizingMode::Fixed,
        }
    }
}

/// Options used when constructing a [`GraphicsContext`](crate::GraphicsContext)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    /// Sizing mode name, see [`SizingMode::parse_lossy`]
    pub sizing: Option<String>,
    /// Mask text blocks against their clip shape instead of clipping them
    pub mask: bool,
    /// Backdrop color of text block masks
    #[serde(deserialize_with = "deserialize_color")]
    pub mask_color: AlphaColor<Srgb>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            sizing: None,
            mask: false,
            mask_color: color::palette::css::WHITE,
        }
    }
}

impl CanvasConfig {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn sizing_mode(&self) -> SizingMode {
        SizingMode::parse_lossy(self.sizing.as_deref())
    }
}

fn deserialize_color<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<AlphaColor<Srgb>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    color::parse_color(&raw)
        .map(|color| color.to_alpha_color::<Srgb>())
        .map_err(serde::de::Error::custom)
}

/// `#rrggbb`, or `#rrggbbaa` for translucent colors.
pub(crate) fn color_to_hex(color: AlphaColor<Srgb>) -> String {
    let rgba = color.to_rgba8();
    if rgba.a == u8::MAX {
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sizing_falls_back_to_fixed() {
        assert_eq!(SizingMode::parse_lossy(None), SizingMode::Fixed);
        assert_eq!(SizingMode::parse_lossy(Some("bogus")), SizingMode::Fixed);
        assert_eq!(SizingMode::parse_lossy(Some(" ViewBox ")), SizingMode::ViewBox);
    }

    #[test]
    fn config_from_json() {
        let json = r#"{
            "width": 300, "height": 200, "sizing": "viewbox",
            "mask": true, "mask_color": "black"
        }"#;
        let config: CanvasConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.width, 300.0);
        assert_eq!(config.sizing_mode(), SizingMode::ViewBox);
        assert!(config.mask);
        assert_eq!(color_to_hex(config.mask_color), "#000000");

        let defaults: CanvasConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.sizing_mode(), SizingMode::Fixed);
        assert_eq!(color_to_hex(defaults.mask_color), "#ffffff");
    }

    #[test]
    fn invalid_mask_color_is_rejected() {
        let config = serde_json::from_str::<CanvasConfig>(r#"{"mask_color": "not a color"}"#);
        assert!(config.is_err());
    }
}
