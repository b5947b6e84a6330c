//! Wrapped, anchor-aligned multi-line text.
//!
//! A text block is a composite: a `g` holding an optional background `rect`, an
//! optional `clipPath` or `mask`, and a `text` with one `tspan` per visual line. Its
//! content is fixed at construction. Placement depends on the rendered size of the
//! text and is recomputed whenever the host reports a geometry change.

mod layout;
mod links;
mod wrap;

pub use links::{Fragment, parse_links};
pub use wrap::wrap_line;

use canvas_traits::{HostSurface, Subscription, SubscriptionId};

use crate::GraphicsContext;
use crate::context::{Placement, TEXT_PADDING, px};
use crate::descriptor::{
    Content, ContentItem, Descriptor, ElementKind, LineRecord, TextAreaOptions, validate_content,
};
use crate::error::{Error, Result};
use crate::node::{Attributes, NodeId, NodeKind};

/// Baseline offset of the first line, in em.
const FIRST_LINE_DY: f64 = 0.9;
/// Distance between consecutive baselines, in em.
const LINE_HEIGHT: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TextBlockState {
    #[default]
    Uninitialized,
    /// Lines are split at newlines but were not measured, because the canvas is not
    /// rendered yet
    ContentParsed,
    /// Lines are wrapped and their primitives built
    Measured,
    /// A layout pass has positioned the block at least once
    LaidOut,
    /// Laid out and listening for geometry changes
    Attached,
}

/// One visual line after wrapping.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    /// Overrides inherited from the source line
    pub attrs: Attributes,
    pub fragments: Vec<Fragment>,
    /// Baseline advance from the previous line, in em
    pub dy: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClipNodes {
    pub(crate) id: String,
    pub(crate) container: NodeId,
    pub(crate) shape: NodeId,
    /// Mask mode only
    pub(crate) backdrop: Option<NodeId>,
}

#[derive(Debug)]
pub struct TextBlock {
    pub(crate) root: NodeId,
    options: TextAreaOptions,
    attrs: Attributes,
    lines: Vec<WrappedLine>,
    state: TextBlockState,

    width: Option<f64>,
    height: Option<f64>,
    offset: f64,
    shift: f64,

    background: Option<NodeId>,
    text: NodeId,
    clip: Option<ClipNodes>,
    subscription: Option<Subscription>,
}

impl TextBlock {
    /// The composite root, a `g`.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn options(&self) -> &TextAreaOptions {
        &self.options
    }

    /// Attributes of the `text` element, as requested.
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn lines(&self) -> &[WrappedLine] {
        &self.lines
    }

    pub fn state(&self) -> TextBlockState {
        self.state
    }

    /// Measured size of the text, once a layout pass has run.
    pub fn size(&self) -> Option<(f64, f64)> {
        self.width.zip(self.height)
    }

    /// Horizontal anchor offset from the last layout pass.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Vertical anchor shift from the last layout pass.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    pub fn background(&self) -> Option<NodeId> {
        self.background
    }

    pub fn text(&self) -> NodeId {
        self.text
    }

    /// The `clipPath` or `mask` element.
    pub fn clip(&self) -> Option<NodeId> {
        self.clip.as_ref().map(|clip| clip.container)
    }

    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(Subscription::id)
    }

    fn padding(&self) -> f64 {
        if self.background.is_some() { TEXT_PADDING } else { 0.0 }
    }
}

/// Split text content into source lines. Anything else has no lines.
fn normalize(content: Content) -> Vec<LineRecord> {
    match content {
        Content::Empty => Vec::new(),
        Content::Text(text) => text.split('\n').map(LineRecord::new).collect(),
        Content::Lines(lines) => lines,
        Content::Nodes(items) => items
            .into_iter()
            .filter_map(|item| match item {
                ContentItem::Text(text) => Some(text),
                ContentItem::Element(_) => None,
            })
            .flat_map(|text| text.split('\n').map(LineRecord::new).collect::<Vec<_>>())
            .collect(),
    }
}

impl<H: HostSurface> GraphicsContext<H> {
    /// Build a text block under `parent`. Returns its root, or `None` if the content
    /// has no visible line.
    pub(crate) fn build_text_block(
        &mut self,
        options: TextAreaOptions,
        attrs: Attributes,
        parent: Option<NodeId>,
        content: Content,
        insert_before: Option<NodeId>,
    ) -> Option<NodeId> {
        let records = normalize(content);
        if records.iter().all(LineRecord::is_blank) {
            #[cfg(feature = "tracing")]
            tracing::debug!("Skipping text block without visible lines");
            return None;
        }
        let mut state = TextBlockState::ContentParsed;

        let max_width = options.max_width.or_else(|| {
            options
                .clip
                .as_ref()
                .and_then(|clip| clip.radius())
                .map(|r| 2.0 * (r - TEXT_PADDING))
        });
        let lines = self.wrap_records(&records, &attrs, max_width, options.parse_links);
        // Detached text measures as zero, so its lines are only split at newlines.
        if self.is_rendered() {
            state = TextBlockState::Measured;
        }

        let group = self.build_node(
            NodeKind::Element("g".to_string()),
            Attributes::new(),
            parent,
            Content::Empty,
            insert_before,
            Placement::Composite,
        );

        let background = options.background.clone().map(|background| {
            let attrs = crate::attrs! { "x" => 0, "y" => 0 }.merged(&background);
            self.build_node(
                NodeKind::Element("rect".to_string()),
                attrs,
                Some(group),
                Content::Empty,
                None,
                Placement::Child,
            )
        });

        let clip = options
            .clip
            .clone()
            .map(|clip| self.build_clip(group, &clip.tag, clip.attrs));

        let mut text_attrs = attrs
            .clone()
            .with("text-anchor", options.anchor.horizontal.text_anchor());
        if let Some(clip) = &clip {
            let reference = if self.is_mask_mode() { "mask" } else { "clip-path" };
            text_attrs.set(reference, format!("url(#{})", clip.id));
        }
        let text = self.build_node(
            NodeKind::Element("text".to_string()),
            text_attrs,
            Some(group),
            Content::Empty,
            None,
            Placement::Child,
        );
        for line in &lines {
            self.build_line(text, line);
        }

        let key = self.text_blocks.insert(TextBlock {
            root: group,
            options,
            attrs,
            lines,
            state,
            width: None,
            height: None,
            offset: 0.0,
            shift: 0.0,
            background,
            text,
            clip,
            subscription: None,
        });
        self.nodes[group].text_block = Some(key);

        self.layout_text_block(key);

        if let Some(handle) = self.nodes[text].host {
            let subscription = Subscription::observe(&mut self.host, handle);
            let block = &mut self.text_blocks[key];
            block.subscription = Some(subscription);
            if block.state == TextBlockState::LaidOut {
                block.state = TextBlockState::Attached;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Built text block {} with {} lines",
            group,
            self.text_blocks[key].lines.len()
        );

        Some(group)
    }

    /// Wrap every source line. Blank lines only push the next line further down.
    fn wrap_records(
        &mut self,
        records: &[LineRecord],
        attrs: &Attributes,
        max_width: Option<f64>,
        parse: bool,
    ) -> Vec<WrappedLine> {
        let mut lines = Vec::new();
        let mut dy = FIRST_LINE_DY;
        for record in records {
            if record.is_blank() {
                dy += LINE_HEIGHT;
                continue;
            }

            let measure_attrs = attrs.clone().merged(&record.attrs);
            let wrapped = wrap_line(&record.content, max_width, |text| {
                self.measure_text(text, &measure_attrs)
                    .map_or(0.0, |bbox| bbox.width())
            });

            #[cfg(feature = "tracing")]
            if wrapped.len() > 1 {
                tracing::debug!("Wrapped {:?} into {} lines", record.content, wrapped.len());
            }

            for text in wrapped {
                let fragments = if parse {
                    parse_links(&text)
                } else {
                    vec![Fragment::Text(text.clone())]
                };
                lines.push(WrappedLine {
                    text,
                    attrs: record.attrs.clone(),
                    fragments,
                    dy,
                });
                dy = LINE_HEIGHT;
            }
        }
        lines
    }

    fn build_line(&mut self, text: NodeId, line: &WrappedLine) -> NodeId {
        let attrs = crate::attrs! {
            "x" => 0,
            "dy" => format!("{}em", px(line.dy)),
        }
        .merged(&line.attrs);

        let content = match line.fragments.as_slice() {
            [Fragment::Text(text)] => Content::Text(text.clone()),
            fragments => Content::Nodes(
                fragments
                    .iter()
                    .map(|fragment| match fragment {
                        Fragment::Text(text) => ContentItem::Text(text.clone()),
                        Fragment::Link { href, text } => ContentItem::Element(Descriptor::new(
                            "a",
                            crate::attrs! { "xlink:href" => href },
                            text.as_str(),
                        )),
                    })
                    .collect(),
            ),
        };

        self.build_node(
            NodeKind::Element("tspan".to_string()),
            attrs,
            Some(text),
            content,
            None,
            Placement::Child,
        )
    }

    /// A `clipPath` holding the shape, or in mask mode a `mask` whose backdrop shows
    /// everything except the shape.
    fn build_clip(&mut self, group: NodeId, tag: &str, attrs: Attributes) -> ClipNodes {
        let mask = self.is_mask_mode();
        let id = self.next_id(if mask { "mask" } else { "clip" });
        let container = self.build_node(
            NodeKind::Element(if mask { "mask" } else { "clipPath" }.to_string()),
            crate::attrs! { "id" => id },
            Some(group),
            Content::Empty,
            None,
            Placement::Child,
        );

        let backdrop = mask.then(|| {
            let fill = self.mask_color().to_string();
            self.build_node(
                NodeKind::Element("rect".to_string()),
                crate::attrs! { "fill" => fill },
                Some(container),
                Content::Empty,
                None,
                Placement::Child,
            )
        });
        let attrs = if mask { attrs.with("fill", "black") } else { attrs };
        let shape = self.build_node(
            NodeKind::Element(tag.to_string()),
            attrs,
            Some(container),
            Content::Empty,
            None,
            Placement::Child,
        );

        ClipNodes {
            id,
            container,
            shape,
            backdrop,
        }
    }

    /// Stop observing a text block and forget it. Its nodes are left alone.
    pub(crate) fn drop_text_block(&mut self, key: usize) {
        let Some(block) = self.text_blocks.try_remove(key) else {
            return;
        };
        if let Some(subscription) = block.subscription {
            subscription.cancel(&mut self.host);
        }
    }

    /// Rebuild the text block rooted at `root` with new content.
    ///
    /// Options and attributes are kept. The old block stops observing before the new
    /// one is built, and the new one takes over `root`'s id. Blank content removes the
    /// block and returns `false`.
    pub fn set_text_block_content(
        &mut self,
        root: NodeId,
        content: impl Into<Content>,
    ) -> Result<bool> {
        let node = self.node_or_err(root)?;
        let key = node.text_block.ok_or(Error::NotATextBlock(root))?;
        let parent = node.parent;
        let block = self.text_blocks.get_mut(key).ok_or(Error::NotATextBlock(root))?;
        let options = block.options.clone();
        let attrs = block.attrs.clone();

        let content = content.into();
        validate_content(&ElementKind::TextArea(Box::new(options.clone())), &content)?;

        if let Some(subscription) = block.subscription.take() {
            subscription.cancel(&mut self.host);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Rebuilding text block {}", root);

        match self.build_text_block(options, attrs, parent, content, Some(root)) {
            Some(rebuilt) => {
                self.replace(root, rebuilt)?;
                Ok(true)
            }
            None => {
                self.remove_subtree(root);
                Ok(false)
            }
        }
    }
}
