use std::collections::BTreeMap;

use canvas_traits::{HostHandle, HostSurface, SubscriptionId, ns};
use kurbo::{Affine, Rect, Size};
use slab::Slab;

use crate::geometry::{parse_length, parse_transform};
use crate::measure::{ASCENT, AdvanceMeasurer, DESCENT, MeasureConfig, TextMeasurer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HostAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub(crate) enum HostNodeKind {
    /// The always-connected container that owns everything rendered.
    Document,
    Element { namespace: String, tag: String },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct HostNode {
    pub kind: HostNodeKind,
    pub attrs: Vec<HostAttribute>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl HostNode {
    fn new(kind: HostNodeKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn tag(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn attr(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.namespace.as_deref() == namespace && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    fn number(&self, name: &str) -> f64 {
        self.attr(None, name)
            .and_then(|raw| parse_length(raw).ok())
            .map(|length| length.to_px(0.0))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Observer {
    target: HostHandle,
    last: Option<Size>,
}

/// A headless SVG document.
///
/// Geometry is computed on demand from attributes: shapes use their own coordinates,
/// groups union their children (through each child's `transform`) and text uses the
/// configured [`TextMeasurer`]. Only elements connected to [`SvgDocument::root`] can be
/// measured.
pub struct SvgDocument {
    nodes: Slab<HostNode>,
    root: usize,
    measurer: Box<dyn TextMeasurer>,
    config: MeasureConfig,
    observers: BTreeMap<SubscriptionId, Observer>,
    next_subscription: u64,
}

impl Default for SvgDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SvgDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgDocument")
            .field("nodes", &self.nodes.len())
            .field("observers", &self.observers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SvgDocument {
    pub fn new() -> Self {
        Self::with_measurer(AdvanceMeasurer::default())
    }

    pub fn with_measurer(measurer: impl TextMeasurer + 'static) -> Self {
        let mut nodes = Slab::new();
        let root = nodes.insert(HostNode::new(HostNodeKind::Document));
        Self {
            nodes,
            root,
            measurer: Box::new(measurer),
            config: MeasureConfig::default(),
            observers: BTreeMap::new(),
            next_subscription: 1,
        }
    }

    pub fn with_config(mut self, config: MeasureConfig) -> Self {
        self.config = config;
        self
    }

    /// The container everything rendered must descend from.
    pub fn root(&self) -> HostHandle {
        HostHandle(self.root)
    }

    /// Number of live host nodes, the document container included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, el: HostHandle) -> bool {
        self.nodes.contains(el.0)
    }

    pub fn tag_name(&self, el: HostHandle) -> Option<&str> {
        self.nodes.get(el.0)?.tag()
    }

    /// The concatenated text of `el` and its descendants.
    pub fn text_content(&self, el: HostHandle) -> String {
        let mut out = String::new();
        self.collect_text(el.0, &mut out);
        out
    }

    /// All attributes of `el` as `(qualified name, value)` pairs, in insertion order.
    pub fn attributes(&self, el: HostHandle) -> Vec<(String, String)> {
        let Some(node) = self.nodes.get(el.0) else {
            return Vec::new();
        };
        node.attrs
            .iter()
            .map(|attr| (self.qualified_name(attr), attr.value.clone()))
            .collect()
    }

    /// Whether `el` descends from the document container.
    pub fn is_connected(&self, el: HostHandle) -> bool {
        let mut current = Some(el.0);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        false
    }

    /// Number of size observations still registered.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Every element descending from `el` (inclusive) whose tag is `tag`, in document order.
    pub fn find_by_tag(&self, el: HostHandle, tag: &str) -> Vec<HostHandle> {
        let mut found = Vec::new();
        let mut stack = vec![el.0];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if node.tag() == Some(tag) {
                found.push(HostHandle(id));
            }
            stack.extend(node.children.iter().rev().copied());
        }
        found
    }

    pub(crate) fn node(&self, id: usize) -> Option<&HostNode> {
        self.nodes.get(id)
    }

    pub(crate) fn qualified_name(&self, attr: &HostAttribute) -> String {
        match attr.namespace.as_deref() {
            Some(ns::XLINK) => format!("xlink:{}", attr.name),
            Some(ns::XMLNS) if attr.name != "xmlns" => format!("xmlns:{}", attr.name),
            _ => attr.name.clone(),
        }
    }

    fn get_mut(&mut self, el: HostHandle, op: &str) -> Option<&mut HostNode> {
        let node = self.nodes.get_mut(el.0);
        if node.is_none() {
            tracing::warn!("{op}: unknown host element {}", el.0);
        }
        node
    }

    fn collect_text(&self, id: usize, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            HostNodeKind::Text(text) => out.push_str(text),
            _ => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn unlink(&mut self, id: usize) {
        let Some(parent) = self.nodes.get_mut(id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|child| *child != id);
        }
    }

    fn is_ancestor_or_self(&self, candidate: usize, of: usize) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        false
    }

    fn font_size(&self, id: usize) -> f64 {
        self.inherited(id, "font-size")
            .and_then(|raw| parse_length(raw).ok())
            .map(|length| length.to_px(self.config.font_size))
            .unwrap_or(self.config.font_size)
    }

    fn inherited(&self, id: usize, name: &str) -> Option<&str> {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.nodes.get(id)?;
            if let Some(value) = node.attr(None, name) {
                return Some(value);
            }
            current = node.parent;
        }
        None
    }

    fn local_transform(&self, id: usize) -> Affine {
        self.nodes
            .get(id)
            .and_then(|node| node.attr(None, "transform"))
            .and_then(|raw| parse_transform(raw).ok())
            .unwrap_or(Affine::IDENTITY)
    }

    fn geometry(&self, id: usize) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let tag = match &node.kind {
            HostNodeKind::Element { tag, .. } => tag.as_str(),
            HostNodeKind::Document => "g",
            HostNodeKind::Text(_) => return None,
        };

        match tag {
            "rect" | "image" | "use" => {
                let x = node.number("x");
                let y = node.number("y");
                Some(Rect::new(
                    x,
                    y,
                    x + node.number("width"),
                    y + node.number("height"),
                ))
            }
            "circle" => {
                let (cx, cy, r) = (node.number("cx"), node.number("cy"), node.number("r"));
                Some(Rect::new(cx - r, cy - r, cx + r, cy + r))
            }
            "ellipse" => {
                let (cx, cy) = (node.number("cx"), node.number("cy"));
                let (rx, ry) = (node.number("rx"), node.number("ry"));
                Some(Rect::new(cx - rx, cy - ry, cx + rx, cy + ry))
            }
            "line" => Some(Rect::from_points(
                (node.number("x1"), node.number("y1")),
                (node.number("x2"), node.number("y2")),
            )),
            "text" => Some(self.text_geometry(id)),
            "clipPath" | "mask" | "defs" | "title" | "desc" => None,
            _ => node
                .children
                .iter()
                .filter_map(|&child| {
                    let bbox = self.geometry(child)?;
                    Some(self.local_transform(child).transform_rect_bbox(bbox))
                })
                .reduce(|acc, bbox| acc.union(bbox)),
        }
    }

    /// Lines are started by the raw text of the element itself and by every `tspan`
    /// carrying an `x`. Each line box spans [`ASCENT`] above and [`DESCENT`] below its
    /// baseline.
    fn text_geometry(&self, id: usize) -> Rect {
        let Some(node) = self.nodes.get(id) else {
            return Rect::ZERO;
        };
        let font_size = self.font_size(id);
        let x = node.number("x");
        let y = node.number("y");

        let mut baseline = 0.0;
        let mut lines: Vec<(f64, String)> = Vec::new();
        for &child in &node.children {
            let Some(child_node) = self.nodes.get(child) else {
                continue;
            };
            match &child_node.kind {
                HostNodeKind::Text(text) => match lines.last_mut() {
                    Some((_, line)) => line.push_str(text),
                    None => lines.push((baseline, text.clone())),
                },
                HostNodeKind::Element { .. } => {
                    let dy = child_node
                        .attr(None, "dy")
                        .and_then(|raw| parse_length(raw).ok())
                        .map(|length| length.to_px(font_size))
                        .unwrap_or(0.0);
                    baseline += dy;

                    let mut text = String::new();
                    self.collect_text(child, &mut text);
                    match lines.last_mut() {
                        Some((_, line)) if child_node.attr(None, "x").is_none() => {
                            line.push_str(&text)
                        }
                        _ => lines.push((baseline, text)),
                    }
                }
                HostNodeKind::Document => {}
            }
        }

        let (Some((first, _)), Some((last, _))) = (lines.first(), lines.last()) else {
            return Rect::new(x, y, x, y);
        };
        let top = first - ASCENT * font_size;
        let bottom = last + DESCENT * font_size;
        let width = lines
            .iter()
            .map(|(_, line)| self.measurer.text_width(line, font_size))
            .fold(0.0, f64::max);

        let left = match self.inherited(id, "text-anchor") {
            Some("middle") => x - width / 2.0,
            Some("end") => x - width,
            _ => x,
        };

        Rect::new(left, y + top, left + width, y + bottom)
    }
}

impl HostSurface for SvgDocument {
    fn create_element(&mut self, namespace: &str, tag: &str) -> HostHandle {
        HostHandle(self.nodes.insert(HostNode::new(HostNodeKind::Element {
            namespace: namespace.to_string(),
            tag: tag.to_string(),
        })))
    }

    fn create_text(&mut self, text: &str) -> HostHandle {
        HostHandle(
            self.nodes
                .insert(HostNode::new(HostNodeKind::Text(text.to_string()))),
        )
    }

    fn set_attribute(&mut self, el: HostHandle, namespace: Option<&str>, name: &str, value: &str) {
        let Some(node) = self.get_mut(el, "set_attribute") else {
            return;
        };
        match node
            .attrs
            .iter_mut()
            .find(|attr| attr.namespace.as_deref() == namespace && attr.name == name)
        {
            Some(attr) => attr.value = value.to_string(),
            None => node.attrs.push(HostAttribute {
                namespace: namespace.map(str::to_string),
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn remove_attribute(&mut self, el: HostHandle, namespace: Option<&str>, name: &str) {
        if let Some(node) = self.get_mut(el, "remove_attribute") {
            node.attrs
                .retain(|attr| !(attr.namespace.as_deref() == namespace && attr.name == name));
        }
    }

    fn attribute(&self, el: HostHandle, namespace: Option<&str>, name: &str) -> Option<String> {
        self.nodes
            .get(el.0)?
            .attr(namespace, name)
            .map(str::to_string)
    }

    fn set_text_content(&mut self, el: HostHandle, text: &str) {
        let Some(node) = self.get_mut(el, "set_text_content") else {
            return;
        };
        if let HostNodeKind::Text(existing) = &mut node.kind {
            *existing = text.to_string();
            return;
        }

        let old_children = std::mem::take(&mut node.children);
        for child in old_children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = None;
            }
            self.release(HostHandle(child));
        }
        let text = self.create_text(text);
        self.append_child(el, text);
    }

    fn append_child(&mut self, parent: HostHandle, child: HostHandle) {
        if !self.nodes.contains(parent.0) || !self.nodes.contains(child.0) {
            tracing::warn!("append_child: unknown host element {} or {}", parent.0, child.0);
            return;
        }
        if self.is_ancestor_or_self(child.0, parent.0) {
            tracing::warn!("append_child: {} would become its own ancestor", child.0);
            return;
        }
        self.unlink(child.0);
        self.nodes[parent.0].children.push(child.0);
        self.nodes[child.0].parent = Some(parent.0);
    }

    fn insert_before(&mut self, parent: HostHandle, child: HostHandle, reference: HostHandle) {
        if child == reference {
            return;
        }
        if !self.nodes.contains(parent.0) || !self.nodes.contains(child.0) {
            tracing::warn!("insert_before: unknown host element {} or {}", parent.0, child.0);
            return;
        }
        if self.is_ancestor_or_self(child.0, parent.0) {
            tracing::warn!("insert_before: {} would become its own ancestor", child.0);
            return;
        }
        self.unlink(child.0);
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|id| *id == reference.0) {
            Some(index) => siblings.insert(index, child.0),
            None => siblings.push(child.0),
        }
        self.nodes[child.0].parent = Some(parent.0);
    }

    fn detach(&mut self, el: HostHandle) {
        if el.0 == self.root {
            return;
        }
        self.unlink(el.0);
    }

    fn release(&mut self, el: HostHandle) {
        if el.0 == self.root {
            return;
        }
        self.unlink(el.0);
        let mut stack = vec![el.0];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.try_remove(id) {
                stack.extend(node.children);
            }
        }
    }

    fn parent(&self, el: HostHandle) -> Option<HostHandle> {
        self.nodes.get(el.0)?.parent.map(HostHandle)
    }

    fn children(&self, el: HostHandle) -> Vec<HostHandle> {
        self.nodes
            .get(el.0)
            .map(|node| node.children.iter().copied().map(HostHandle).collect())
            .unwrap_or_default()
    }

    fn bounding_box(&self, el: HostHandle) -> Option<Rect> {
        if !self.is_connected(el) {
            return None;
        }
        self.geometry(el.0)
    }

    fn observe_size(&mut self, el: HostHandle) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.insert(
            id,
            Observer {
                target: el,
                last: None,
            },
        );
        id
    }

    fn unobserve(&mut self, id: SubscriptionId) {
        self.observers.remove(&id);
    }

    fn take_geometry_changes(&mut self) -> Vec<SubscriptionId> {
        let sizes: Vec<(SubscriptionId, Option<Size>)> = self
            .observers
            .iter()
            .map(|(id, observer)| (*id, self.bounding_box(observer.target).map(|r| r.size())))
            .collect();

        let mut changed = Vec::new();
        for (id, size) in sizes {
            let Some(observer) = self.observers.get_mut(&id) else {
                continue;
            };
            if observer.last != size {
                observer.last = size;
                if size.is_some() {
                    changed.push(id);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MockTextMeasurer;

    fn element(doc: &mut SvgDocument, tag: &str, attrs: &[(&str, &str)]) -> HostHandle {
        let el = doc.create_element(ns::SVG, tag);
        for (name, value) in attrs {
            doc.set_attribute(el, None, name, value);
        }
        el
    }

    #[test]
    fn detached_elements_cannot_be_measured() {
        let mut doc = SvgDocument::new();
        let rect = element(&mut doc, "rect", &[("width", "10"), ("height", "5")]);
        assert_eq!(doc.bounding_box(rect), None);

        let root = doc.root();
        doc.append_child(root, rect);
        assert_eq!(doc.bounding_box(rect), Some(Rect::new(0.0, 0.0, 10.0, 5.0)));
    }

    #[test]
    fn groups_union_translated_children() {
        let mut doc = SvgDocument::new();
        let root = doc.root();
        let group = element(&mut doc, "g", &[]);
        let a = element(&mut doc, "rect", &[("width", "10"), ("height", "10")]);
        let b = element(
            &mut doc,
            "circle",
            &[("r", "5"), ("transform", "translate(20 20)")],
        );
        doc.append_child(root, group);
        doc.append_child(group, a);
        doc.append_child(group, b);

        assert_eq!(doc.bounding_box(group), Some(Rect::new(0.0, 0.0, 25.0, 25.0)));
    }

    #[test]
    fn text_lines_use_the_measurer() {
        let mut measurer = MockTextMeasurer::new();
        measurer
            .expect_text_width()
            .returning(|text, _| text.len() as f64);
        let mut doc = SvgDocument::with_measurer(measurer);
        let root = doc.root();

        let text = element(&mut doc, "text", &[("font-size", "10")]);
        doc.append_child(root, text);
        for (dy, content) in [("0.9em", "abc"), ("1.2em", "abcdef")] {
            let line = element(&mut doc, "tspan", &[("x", "0"), ("dy", dy)]);
            let raw = doc.create_text(content);
            doc.append_child(line, raw);
            doc.append_child(text, line);
        }

        let bbox = doc.bounding_box(text).unwrap();
        assert_eq!(bbox.width(), 6.0);
        assert!((bbox.height() - 24.0).abs() < 1e-9);
        assert!(bbox.y0.abs() < 1e-9);
    }

    #[test]
    fn text_anchor_shifts_the_box() {
        let mut doc = SvgDocument::with_measurer(|text: &str, _: f64| text.len() as f64 * 2.0);
        let root = doc.root();
        let text = element(&mut doc, "text", &[("text-anchor", "middle")]);
        doc.append_child(root, text);
        doc.set_text_content(text, "abcd");

        let bbox = doc.bounding_box(text).unwrap();
        assert_eq!((bbox.x0, bbox.x1), (-4.0, 4.0));
    }

    #[test]
    fn insert_before_and_release() {
        let mut doc = SvgDocument::new();
        let root = doc.root();
        let a = element(&mut doc, "rect", &[]);
        let b = element(&mut doc, "rect", &[]);
        let c = element(&mut doc, "rect", &[]);
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.insert_before(root, c, b);
        assert_eq!(doc.children(root), vec![a, c, b]);

        doc.release(c);
        assert_eq!(doc.children(root), vec![a, b]);
        assert!(!doc.contains(c));
    }

    #[test]
    fn observers_report_size_changes_once() {
        let mut doc = SvgDocument::new();
        let root = doc.root();
        let rect = element(&mut doc, "rect", &[("width", "1"), ("height", "1")]);
        let sub = doc.observe_size(rect);
        assert!(doc.take_geometry_changes().is_empty());

        doc.append_child(root, rect);
        assert_eq!(doc.take_geometry_changes(), vec![sub]);
        assert!(doc.take_geometry_changes().is_empty());

        doc.set_attribute(rect, None, "width", "4");
        assert_eq!(doc.take_geometry_changes(), vec![sub]);

        doc.unobserve(sub);
        doc.set_attribute(rect, None, "width", "8");
        assert!(doc.take_geometry_changes().is_empty());
    }
}
