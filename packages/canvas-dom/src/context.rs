use std::collections::HashMap;

use canvas_traits::{HostHandle, HostSurface, ns};
use kurbo::Rect;
use slab::Slab;

use crate::config::{CanvasConfig, SizingMode, color_to_hex};
use crate::descriptor::{Content, ContentItem, Descriptor, ElementKind, validate_content};
use crate::error::{Error, Result};
use crate::node::{Attributes, Node, NodeFlags, NodeId, NodeKind};
use crate::text::TextBlock;

/// Padding between a text block and its background, in pixels.
pub const TEXT_PADDING: f64 = 5.0;

/// Where a freshly built node is recorded in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Child,
    Composite,
}

#[derive(Debug, Clone, Copy)]
struct ShadowBuffer {
    group: NodeId,
    measure: NodeId,
}

/// Owner of a retained primitive tree and the host document it is reflected onto.
///
/// Nodes live in a slab and are addressed by [`NodeId`]. Every mutation is applied to
/// the host immediately.
pub struct GraphicsContext<H: HostSurface> {
    pub(crate) host: H,

    width: f64,
    height: f64,
    sizing: SizingMode,
    mask: bool,
    mask_color: String,
    namespaces: HashMap<String, String>,
    id_counter: u64,

    /// Every live node. This doubles as the attribute-queryable registry.
    pub(crate) nodes: Slab<Node>,
    pub(crate) root: NodeId,
    shadow: Option<ShadowBuffer>,
    pub(crate) text_blocks: Slab<TextBlock>,
}

impl<H: HostSurface> std::fmt::Debug for GraphicsContext<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sizing", &self.sizing)
            .field("nodes", &self.nodes.len())
            .field("text_blocks", &self.text_blocks.len())
            .finish()
    }
}

impl<H: HostSurface> GraphicsContext<H> {
    /// Create a context with a root `svg` element in `host`.
    pub fn new(host: H, config: CanvasConfig) -> Self {
        let sizing = config.sizing_mode();
        let mut context = Self {
            host,
            width: config.width,
            height: config.height,
            sizing,
            mask: config.mask,
            mask_color: color_to_hex(config.mask_color),
            namespaces: ns::default_prefixes()
                .into_iter()
                .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
                .collect(),
            id_counter: 0,
            nodes: Slab::new(),
            root: 0,
            shadow: None,
            text_blocks: Slab::new(),
        };

        let attrs = context.root_attributes();
        context.root = context.build_node(
            NodeKind::Element("svg".to_string()),
            attrs,
            None,
            Content::Empty,
            None,
            Placement::Child,
        );
        context
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn sizing_mode(&self) -> SizingMode {
        self.sizing
    }

    pub fn is_mask_mode(&self) -> bool {
        self.mask
    }

    pub fn mask_color(&self) -> &str {
        &self.mask_color
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn node_or_err(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Number of live nodes, the root and the shadow buffer included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The text block whose composite root is `root`.
    pub fn text_block(&self, root: NodeId) -> Option<&TextBlock> {
        let key = self.nodes.get(root)?.text_block?;
        self.text_blocks.get(key)
    }

    /// Register a namespace prefix usable in attribute names (`prefix:name`).
    pub fn register_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.insert(prefix.into(), uri.into());
    }

    /// A context-unique DOM id, e.g. for `clipPath` references.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.id_counter += 1;
        format!("{prefix}-{}", self.id_counter)
    }

    /// Create a node, or a text block for [`ElementKind::TextArea`].
    ///
    /// Returns `Ok(None)` for a text block whose content is empty or blank. The whole
    /// descriptor tree is validated before the host is touched.
    pub fn create_element(
        &mut self,
        kind: ElementKind,
        attrs: Attributes,
        parent: Option<NodeId>,
        content: Content,
        insert_before: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        if let Some(parent) = parent {
            self.node_or_err(parent)?;
        }
        validate_content(&kind, &content)?;
        Ok(self.build(kind, attrs, parent, content, insert_before))
    }

    /// Create a direct child of the root.
    pub fn add(
        &mut self,
        kind: impl Into<ElementKind>,
        attrs: Attributes,
        content: impl Into<Content>,
    ) -> Result<Option<NodeId>> {
        self.create_element(kind.into(), attrs, Some(self.root), content.into(), None)
    }

    /// Every live node whose attributes match all of `criteria`, in id order.
    pub fn get_elements_by_attributes<K: AsRef<str>, V: AsRef<str>>(
        &self,
        criteria: &[(K, V)],
    ) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.attrs.matches(criteria))
            .map(|(id, _)| id)
            .collect()
    }

    /// Attach the root element to `container`, moving it out of any previous parent.
    pub fn render(&mut self, container: HostHandle) {
        let Some(root) = self.nodes[self.root].host else {
            return;
        };
        self.host.detach(root);
        self.host.append_child(container, root);
    }

    /// Whether the root is attached to a container, so text can be measured.
    pub(crate) fn is_rendered(&self) -> bool {
        self.nodes[self.root]
            .host
            .is_some_and(|root| self.host.parent(root).is_some())
    }

    /// Returns whether the size changed.
    pub fn resize(&mut self, width: f64, height: f64) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        let attrs = self.root_attributes();
        let root = self.root;
        self.apply_attributes(root, &attrs);
        true
    }

    /// Drain geometry changes from the host and lay out the text blocks they belong to.
    ///
    /// Returns the number of layouts applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        for subscription in self.host.take_geometry_changes() {
            let block = self.text_blocks.iter().find_map(|(key, block)| {
                (block.subscription_id() == Some(subscription)).then_some(key)
            });
            if let Some(block) = block {
                if self.layout_text_block(block) {
                    applied += 1;
                }
            }
        }
        applied
    }

    fn root_attributes(&self) -> Attributes {
        match self.sizing {
            SizingMode::Fixed => crate::attrs! {
                "width" => px(self.width),
                "height" => px(self.height),
            },
            SizingMode::ViewBox => crate::attrs! {
                "viewBox" => format!("0 0 {} {}", px(self.width), px(self.height)),
                "style" => format!(
                    "max-width: {}px; max-height: {}px;",
                    px(self.width),
                    px(self.height)
                ),
            },
        }
    }

    /// Build a validated element. Text blocks go through the text block builder.
    pub(crate) fn build(
        &mut self,
        kind: ElementKind,
        attrs: Attributes,
        parent: Option<NodeId>,
        content: Content,
        insert_before: Option<NodeId>,
    ) -> Option<NodeId> {
        let kind = match kind {
            ElementKind::TextArea(options) => {
                return self.build_text_block(*options, attrs, parent, content, insert_before);
            }
            ElementKind::Shape(tag) => NodeKind::Element(tag),
            ElementKind::RawText => NodeKind::RawText,
        };
        Some(self.build_node(kind, attrs, parent, content, insert_before, Placement::Child))
    }

    /// Register a node in the arena and its parent, then create its host element.
    pub(crate) fn build_node(
        &mut self,
        kind: NodeKind,
        attrs: Attributes,
        parent: Option<NodeId>,
        content: Content,
        insert_before: Option<NodeId>,
        placement: Placement,
    ) -> NodeId {
        let entry = self.nodes.vacant_entry();
        let id = entry.key();
        entry.insert(Node::new(id, kind, attrs, parent, content, insert_before));

        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            let list = match placement {
                Placement::Child => &mut parent.children,
                Placement::Composite => &mut parent.composites,
            };
            match insert_before.and_then(|sibling| list.iter().position(|id| *id == sibling)) {
                Some(index) => list.insert(index, id),
                None => list.push(id),
            }
        }

        self.create_host(id);
        id
    }

    /// Build the host primitive of `id`: attributes, then content, then insertion.
    fn create_host(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let handle = match &node.kind {
            NodeKind::RawText => {
                let text = match &node.content {
                    Content::Text(text) => text.as_str(),
                    _ => "",
                };
                self.host.create_text(text)
            }
            NodeKind::Element(tag) => self.host.create_element(ns::SVG, tag),
        };
        self.nodes[id].host = Some(handle);

        let attrs = self.nodes[id].attrs.clone();
        for attr in attrs.iter() {
            self.set_host_attribute(handle, &attr.name, &attr.value);
        }

        if matches!(self.nodes[id].kind, NodeKind::Element(_)) {
            match &self.nodes[id].content {
                Content::Empty => {}
                Content::Text(text) => {
                    let text = text.clone();
                    self.host.set_text_content(handle, &text);
                }
                Content::Lines(lines) => {
                    let text = lines
                        .iter()
                        .map(|line| line.content.as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.host.set_text_content(handle, &text);
                }
                Content::Nodes(items) => {
                    for item in items.clone() {
                        match item {
                            ContentItem::Text(text) => {
                                self.build_node(
                                    NodeKind::RawText,
                                    Attributes::new(),
                                    Some(id),
                                    Content::Text(text),
                                    None,
                                    Placement::Child,
                                );
                            }
                            ContentItem::Element(Descriptor {
                                kind,
                                attrs,
                                content,
                            }) => {
                                self.build(kind, attrs, Some(id), content, None);
                            }
                        }
                    }
                }
            }
        }

        let node = &self.nodes[id];
        let Some(parent_handle) = node.parent.and_then(|parent| self.nodes.get(parent)?.host)
        else {
            return;
        };
        let sibling = node
            .insert_before
            .and_then(|sibling| self.nodes.get(sibling))
            .filter(|sibling| sibling.parent == node.parent)
            .and_then(|sibling| sibling.host);
        match sibling {
            Some(sibling) => self.host.insert_before(parent_handle, handle, sibling),
            None => self.host.append_child(parent_handle, handle),
        }
    }

    /// Write `attrs` to the node and its host element. Keys not in `attrs` are kept.
    pub(crate) fn apply_attributes(&mut self, id: NodeId, attrs: &Attributes) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.attrs.merge(attrs);
        let Some(handle) = node.host else {
            return;
        };
        for attr in attrs.iter() {
            self.set_host_attribute(handle, &attr.name, &attr.value);
        }
    }

    fn split_name<'a>(&'a self, name: &'a str) -> (Option<&'a str>, &'a str) {
        match name.split_once(':') {
            Some((prefix, local)) => match self.namespaces.get(prefix) {
                Some(uri) => (Some(uri.as_str()), local),
                None => (None, name),
            },
            None => (None, name),
        }
    }

    fn set_host_attribute(&mut self, handle: HostHandle, name: &str, value: &str) {
        let (namespace, local) = self.split_name(name);
        let namespace = namespace.map(str::to_string);
        let local = local.to_string();
        self.host
            .set_attribute(handle, namespace.as_deref(), &local, value);
    }

    fn remove_host_attribute(&mut self, handle: HostHandle, name: &str) {
        let (namespace, local) = self.split_name(name);
        let namespace = namespace.map(str::to_string);
        let local = local.to_string();
        self.host.remove_attribute(handle, namespace.as_deref(), &local);
    }

    /// The hidden group used for measuring text, created on first use.
    pub fn shadow_buffer(&mut self) -> NodeId {
        self.shadow_nodes().group
    }

    fn shadow_nodes(&mut self) -> ShadowBuffer {
        if let Some(shadow) = self.shadow {
            return shadow;
        }

        let group = self.build_node(
            NodeKind::Element("g".to_string()),
            crate::attrs! {
                "class" => "shadow-buffer",
                "style" => "visibility: hidden;",
            },
            Some(self.root),
            Content::Empty,
            None,
            Placement::Child,
        );
        let measure = self.build_node(
            NodeKind::Element("text".to_string()),
            Attributes::new(),
            Some(group),
            Content::Empty,
            None,
            Placement::Child,
        );
        for id in [group, measure] {
            self.nodes[id].flags.insert(NodeFlags::SHADOW);
        }

        let shadow = ShadowBuffer { group, measure };
        self.shadow = Some(shadow);
        shadow
    }

    /// Render `text` with exactly `attrs` on the measurement node and read its box back.
    ///
    /// The measurement node is shared scratch state: the result is only valid until the
    /// next call.
    pub(crate) fn measure_text(&mut self, text: &str, attrs: &Attributes) -> Option<Rect> {
        let measure = self.shadow_nodes().measure;
        let handle = self.nodes[measure].host?;

        let stale: Vec<String> = self.nodes[measure]
            .attrs
            .iter()
            .filter(|attr| !attrs.contains(&attr.name))
            .map(|attr| attr.name.clone())
            .collect();
        for name in &stale {
            self.remove_host_attribute(handle, name);
            self.nodes[measure].attrs.remove(name);
        }
        self.apply_attributes(measure, attrs);
        self.host.set_text_content(handle, text);
        self.nodes[measure].content = Content::Text(text.to_string());

        self.host.bounding_box(handle)
    }

    /// Forget the shadow buffer if `id` belongs to it. It is rebuilt lazily.
    pub(crate) fn forget_shadow(&mut self, id: NodeId) {
        if let Some(shadow) = self.shadow {
            if shadow.group == id || shadow.measure == id {
                self.shadow = None;
            }
        }
    }
}

/// Format a pixel value without a trailing `.0`, and without negative zero.
pub(crate) fn px(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    format!("{}", rounded + 0.0)
}
