//! Typed element descriptors, and their decoding from collaborators' JSON.
//!
//! Upstream code describes what to draw as `{type, attributes, content}` trees. The
//! `type` string is resolved once here into an [`ElementKind`], so the factories never
//! branch on type names.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::node::Attributes;

/// Type name that selects a text block.
pub const TEXT_AREA_TYPE: &str = "textarea";

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// A primitive named by its SVG tag.
    Shape(String),
    /// A bare text unit.
    RawText,
    /// A wrapped, anchor-aligned text block.
    TextArea(Box<TextAreaOptions>),
}

impl ElementKind {
    pub fn shape(tag: impl Into<String>) -> Self {
        ElementKind::Shape(tag.into())
    }

    pub fn text_area(options: TextAreaOptions) -> Self {
        ElementKind::TextArea(Box::new(options))
    }

    fn label(&self) -> &'static str {
        match self {
            ElementKind::Shape(_) => "shape",
            ElementKind::RawText => "raw text",
            ElementKind::TextArea(_) => "text area",
        }
    }
}

impl From<&str> for ElementKind {
    fn from(value: &str) -> Self {
        match value {
            "" => ElementKind::RawText,
            TEXT_AREA_TYPE => ElementKind::text_area(TextAreaOptions::default()),
            tag => ElementKind::Shape(tag.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HorizontalAnchor {
    #[default]
    Left,
    Start,
    Center,
    Right,
    End,
}

impl HorizontalAnchor {
    pub fn parse_lossy(raw: &str) -> Self {
        match raw {
            "start" => HorizontalAnchor::Start,
            "center" | "middle" => HorizontalAnchor::Center,
            "right" => HorizontalAnchor::Right,
            "end" => HorizontalAnchor::End,
            _ => HorizontalAnchor::Left,
        }
    }

    /// Value of the SVG `text-anchor` property.
    pub fn text_anchor(self) -> &'static str {
        match self {
            HorizontalAnchor::Left | HorizontalAnchor::Start => "start",
            HorizontalAnchor::Center => "middle",
            HorizontalAnchor::Right | HorizontalAnchor::End => "end",
        }
    }

    /// Distance from the block's left edge to its anchor point.
    pub fn offset(self, width: f64) -> f64 {
        match self {
            HorizontalAnchor::Left | HorizontalAnchor::Start => 0.0,
            HorizontalAnchor::Center => (width / 2.0).floor(),
            HorizontalAnchor::Right | HorizontalAnchor::End => width,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerticalAnchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAnchor {
    pub fn parse_lossy(raw: &str) -> Self {
        match raw {
            "middle" | "center" => VerticalAnchor::Middle,
            "bottom" => VerticalAnchor::Bottom,
            _ => VerticalAnchor::Top,
        }
    }

    /// Distance from the block's top edge to its anchor point.
    pub fn shift(self, height: f64) -> f64 {
        match self {
            VerticalAnchor::Top => 0.0,
            VerticalAnchor::Middle => (height / 2.0).floor(),
            VerticalAnchor::Bottom => height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anchor {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

/// A shape used to clip or mask a text block, in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipShape {
    pub tag: String,
    pub attrs: Attributes,
}

impl ClipShape {
    pub fn new(tag: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            tag: tag.into(),
            attrs,
        }
    }

    /// Radius of a circular clip.
    pub fn radius(&self) -> Option<f64> {
        (self.tag == "circle")
            .then(|| self.attrs.get_f64("r"))
            .flatten()
    }
}

/// Text block specific attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextAreaOptions {
    pub x: f64,
    pub y: f64,
    pub anchor: Anchor,
    /// Attributes of the background `rect`, if any
    pub background: Option<Attributes>,
    pub clip: Option<ClipShape>,
    pub parse_links: bool,
    /// Wrap width in pixels. Derived from a circular clip when unset.
    pub max_width: Option<f64>,
}

impl TextAreaOptions {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// One source line of a text block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineRecord {
    pub content: String,
    /// Overrides applied to this line's primitives
    pub attrs: Attributes,
}

impl LineRecord {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attrs: Attributes::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    Nodes(Vec<ContentItem>),
    Lines(Vec<LineRecord>),
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<Vec<Descriptor>> for Content {
    fn from(value: Vec<Descriptor>) -> Self {
        Content::Nodes(value.into_iter().map(ContentItem::Element).collect())
    }
}

impl From<Vec<LineRecord>> for Content {
    fn from(value: Vec<LineRecord>) -> Self {
        Content::Lines(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    /// Becomes an anonymous raw text child
    Text(String),
    Element(Descriptor),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub kind: ElementKind,
    pub attrs: Attributes,
    pub content: Content,
}

impl Descriptor {
    pub fn new(
        kind: impl Into<ElementKind>,
        attrs: Attributes,
        content: impl Into<Content>,
    ) -> Self {
        Self {
            kind: kind.into(),
            attrs,
            content: content.into(),
        }
    }

    /// Decode a single descriptor from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDescriptor = serde_json::from_str(json)?;
        raw.into_descriptor(&mut Vec::new())
    }

    /// Decode a descriptor list from JSON. Fails without partial results.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        let raw: Vec<RawDescriptor> = serde_json::from_str(json)?;
        RawDescriptor::into_descriptors(raw)
    }

    /// Check the whole tree before anything is built from it.
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.kind, &self.content)
    }
}

pub(crate) fn validate_content(kind: &ElementKind, content: &Content) -> Result<()> {
    match (kind, content) {
        (_, Content::Empty) | (_, Content::Text(_)) => Ok(()),
        (ElementKind::TextArea(_), Content::Lines(_)) => Ok(()),
        (ElementKind::TextArea(_), Content::Nodes(items)) => {
            if items.iter().all(|item| matches!(item, ContentItem::Text(_))) {
                Ok(())
            } else {
                Err(Error::UnsupportedContent(kind.label()))
            }
        }
        (ElementKind::Shape(_), Content::Nodes(items)) => {
            items.iter().try_for_each(|item| match item {
                ContentItem::Text(_) => Ok(()),
                ContentItem::Element(descriptor) => descriptor.validate(),
            })
        }
        _ => Err(Error::UnsupportedContent(kind.label())),
    }
}

/// A descriptor as collaborators send it: untyped and possibly incomplete.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDescriptor {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub content: Option<RawContent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawContent {
    Text(String),
    Number(serde_json::Number),
    List(Vec<RawItem>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawItem {
    Text(String),
    Node(RawDescriptor),
}

impl RawDescriptor {
    pub fn new(kind: Option<&str>) -> Self {
        Self {
            kind: kind.map(str::to_string),
            ..Default::default()
        }
    }

    /// Convert a whole list, failing on the first entry without a type.
    pub fn into_descriptors(raw: Vec<RawDescriptor>) -> Result<Vec<Descriptor>> {
        let mut path = Vec::new();
        raw.into_iter()
            .enumerate()
            .map(|(index, raw)| {
                path.push(index);
                let descriptor = raw.into_descriptor(&mut path);
                path.pop();
                descriptor
            })
            .collect()
    }

    fn into_descriptor(self, path: &mut Vec<usize>) -> Result<Descriptor> {
        let Some(kind) = self.kind else {
            return Err(Error::MissingType { path: path.clone() });
        };

        let mut attributes = self.attributes;
        let kind = match ElementKind::from(kind.as_str()) {
            ElementKind::TextArea(_) => {
                ElementKind::text_area(take_text_area_options(&mut attributes)?)
            }
            kind => kind,
        };
        let attrs = scalar_attributes(attributes)?;

        let content = match (self.content, &kind) {
            (None, _) => Content::Empty,
            (Some(RawContent::Text(text)), _) => Content::Text(text),
            (Some(RawContent::Number(number)), _) => Content::Text(number.to_string()),
            (Some(RawContent::List(items)), ElementKind::TextArea(_)) => Content::Lines(
                items
                    .into_iter()
                    .map(line_record)
                    .collect::<Result<Vec<_>>>()?,
            ),
            (Some(RawContent::List(items)), _) => {
                let mut nodes = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    nodes.push(match item {
                        RawItem::Text(text) => ContentItem::Text(text),
                        RawItem::Node(raw) => {
                            path.push(index);
                            let descriptor = raw.into_descriptor(path);
                            path.pop();
                            ContentItem::Element(descriptor?)
                        }
                    });
                }
                Content::Nodes(nodes)
            }
        };

        Ok(Descriptor {
            kind,
            attrs,
            content,
        })
    }
}

fn line_record(item: RawItem) -> Result<LineRecord> {
    match item {
        RawItem::Text(text) => Ok(LineRecord::new(text)),
        RawItem::Node(raw) => {
            let content = match raw.content {
                None => String::new(),
                Some(RawContent::Text(text)) => text,
                Some(RawContent::Number(number)) => number.to_string(),
                Some(RawContent::List(_)) => {
                    return Err(Error::InvalidDescriptor(
                        "line content must be a string".to_string(),
                    ));
                }
            };
            Ok(LineRecord {
                content,
                attrs: scalar_attributes(raw.attributes)?,
            })
        }
    }
}

fn scalar(name: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(value) => Ok(Some(value)),
        Value::Number(value) => Ok(Some(value.to_string())),
        Value::Bool(value) => Ok(Some(value.to_string())),
        Value::Array(_) | Value::Object(_) => Err(Error::InvalidDescriptor(format!(
            "attribute {name:?} must be a scalar"
        ))),
    }
}

fn scalar_attributes(map: Map<String, Value>) -> Result<Attributes> {
    let mut attrs = Attributes::new();
    for (name, value) in map {
        if let Some(value) = scalar(&name, value)? {
            attrs.set(name, value);
        }
    }
    Ok(attrs)
}

fn number(name: &str, value: Value) -> Result<f64> {
    let parsed = match &value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::InvalidDescriptor(format!("{name:?} must be a number")))
}

fn take_text_area_options(attributes: &mut Map<String, Value>) -> Result<TextAreaOptions> {
    let mut options = TextAreaOptions::default();

    if let Some(x) = attributes.remove("x") {
        options.x = number("x", x)?;
    }
    if let Some(y) = attributes.remove("y") {
        options.y = number("y", y)?;
    }
    if let Some(max_width) = attributes.remove("max_width").filter(|v| !v.is_null()) {
        options.max_width = Some(number("max_width", max_width)?);
    }
    if let Some(parse_links) = attributes.remove("parse_links") {
        options.parse_links = match parse_links {
            Value::Bool(flag) => flag,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            Value::Null => false,
            _ => {
                return Err(Error::InvalidDescriptor(
                    "\"parse_links\" must be a boolean".to_string(),
                ));
            }
        };
    }

    match attributes.remove("anchor") {
        None | Some(Value::Null) => {}
        Some(Value::Object(anchor)) => {
            if let Some(Value::String(horizontal)) = anchor.get("horizontal") {
                options.anchor.horizontal = HorizontalAnchor::parse_lossy(horizontal);
            }
            if let Some(Value::String(vertical)) = anchor.get("vertical") {
                options.anchor.vertical = VerticalAnchor::parse_lossy(vertical);
            }
        }
        Some(_) => {
            return Err(Error::InvalidDescriptor(
                "\"anchor\" must be an object".to_string(),
            ));
        }
    }

    match attributes.remove("background") {
        None | Some(Value::Null) => {}
        Some(Value::Object(background)) => {
            options.background = Some(scalar_attributes(background)?);
        }
        Some(_) => {
            return Err(Error::InvalidDescriptor(
                "\"background\" must be an object".to_string(),
            ));
        }
    }

    match attributes.remove("clip") {
        None | Some(Value::Null) => {}
        Some(Value::Object(mut clip)) => {
            let Some(Value::String(tag)) = clip.remove("type") else {
                return Err(Error::InvalidDescriptor("clip shape has no type".to_string()));
            };
            let attrs = match clip.remove("attributes") {
                Some(Value::Object(attrs)) => scalar_attributes(attrs)?,
                _ => Attributes::new(),
            };
            options.clip = Some(ClipShape::new(tag, attrs));
        }
        Some(_) => {
            return Err(Error::InvalidDescriptor(
                "\"clip\" must be an object".to_string(),
            ));
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_descriptor_without_type_reports_its_path() {
        let json = r#"[
            {"type": "g", "content": [
                {"type": "rect"},
                "label",
                {"attributes": {"x": 1}}
            ]}
        ]"#;
        match Descriptor::list_from_json(json) {
            Err(Error::MissingType { path }) => assert_eq!(path, vec![0, 2]),
            other => panic!("expected MissingType, got {other:?}"),
        }
    }

    #[test]
    fn text_area_attributes_are_lifted_into_options() {
        let json = r##"{
            "type": "textarea",
            "attributes": {
                "x": 10, "y": "20", "fill": "#333", "font-size": 11,
                "anchor": {"horizontal": "center", "vertical": "bottom"},
                "background": {"fill": "#fff"},
                "clip": {"type": "circle", "attributes": {"cx": 10, "cy": 20, "r": 30}},
                "parse_links": true
            },
            "content": ["first", {"content": "second", "attributes": {"font-weight": "bold"}}]
        }"##;
        let descriptor = Descriptor::from_json(json).unwrap();

        let ElementKind::TextArea(options) = &descriptor.kind else {
            panic!("expected a text area, got {:?}", descriptor.kind);
        };
        assert_eq!((options.x, options.y), (10.0, 20.0));
        assert_eq!(options.anchor.horizontal, HorizontalAnchor::Center);
        assert_eq!(options.anchor.vertical, VerticalAnchor::Bottom);
        assert_eq!(options.background.as_ref().and_then(|bg| bg.get("fill")), Some("#fff"));
        assert_eq!(options.clip.as_ref().and_then(ClipShape::radius), Some(30.0));
        assert!(options.parse_links);

        assert_eq!(descriptor.attrs.get("fill"), Some("#333"));
        assert_eq!(descriptor.attrs.get("font-size"), Some("11"));
        assert!(!descriptor.attrs.contains("anchor"));

        let Content::Lines(lines) = &descriptor.content else {
            panic!("expected lines, got {:?}", descriptor.content);
        };
        assert_eq!(lines[0], LineRecord::new("first"));
        assert_eq!(lines[1].content, "second");
        assert_eq!(lines[1].attrs.get("font-weight"), Some("bold"));
    }

    #[test]
    fn raw_text_and_shapes() {
        assert_eq!(ElementKind::from(""), ElementKind::RawText);
        assert_eq!(ElementKind::from("rect"), ElementKind::shape("rect"));
        assert!(matches!(ElementKind::from("textarea"), ElementKind::TextArea(_)));
    }

    #[test]
    fn anchors() {
        assert_eq!(HorizontalAnchor::Center.offset(101.0), 50.0);
        assert_eq!(HorizontalAnchor::End.offset(101.0), 101.0);
        assert_eq!(HorizontalAnchor::parse_lossy("bogus"), HorizontalAnchor::Left);
        assert_eq!(VerticalAnchor::Middle.shift(31.0), 15.0);
    }

    #[test]
    fn text_area_rejects_nested_elements() {
        let descriptor = Descriptor::new(
            ElementKind::text_area(TextAreaOptions::default()),
            Attributes::new(),
            vec![Descriptor::new("rect", Attributes::new(), Content::Empty)],
        );
        assert!(matches!(
            descriptor.validate(),
            Err(Error::UnsupportedContent("text area"))
        ));
    }
}
