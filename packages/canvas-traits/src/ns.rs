//! Well known XML namespaces.

pub const SVG: &str = "http://www.w3.org/2000/svg";
pub const XLINK: &str = "http://www.w3.org/1999/xlink";
pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";

/// The namespace table every canvas starts with: prefix to namespace uri.
pub fn default_prefixes() -> [(&'static str, &'static str); 2] {
    [("xlink", XLINK), ("xmlns", XMLNS)]
}
