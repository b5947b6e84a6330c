use canvas_traits::HostSurface;

use super::TextBlockState;
use crate::GraphicsContext;
use crate::context::{TEXT_PADDING, px};
use crate::node::Attributes;

const X_ATTRIBUTES: [&str; 4] = ["x", "cx", "x1", "x2"];
const Y_ATTRIBUTES: [&str; 4] = ["y", "cy", "y1", "y2"];

/// Move a clip shape given in canvas coordinates into the text's local space, whose
/// origin sits at `origin` on the canvas.
fn localize_clip(attrs: &Attributes, origin: (f64, f64)) -> Attributes {
    attrs
        .iter()
        .map(|attr| {
            let name = attr.name.as_str();
            let delta = if X_ATTRIBUTES.contains(&name) {
                Some(origin.0)
            } else if Y_ATTRIBUTES.contains(&name) {
                Some(origin.1)
            } else {
                None
            };
            let value = match (delta, attr.value.trim().parse::<f64>()) {
                (Some(delta), Ok(value)) => px(value - delta),
                _ => attr.value.clone(),
            };
            (attr.name.clone(), value)
        })
        .collect()
}

fn translate(x: f64, y: f64) -> String {
    format!("translate({}, {})", px(x), px(y))
}

impl<H: HostSurface> GraphicsContext<H> {
    /// Position a text block from the current size of its text.
    ///
    /// Does nothing and returns `false` while the text cannot be measured: detached,
    /// or measured as empty. Running it twice on unchanged geometry writes the same
    /// attributes.
    pub(crate) fn layout_text_block(&mut self, key: usize) -> bool {
        let Some(block) = self.text_blocks.get(key) else {
            return false;
        };
        let bbox = self
            .nodes
            .get(block.text)
            .and_then(|text| text.host)
            .and_then(|handle| self.host.bounding_box(handle))
            .filter(|bbox| bbox.width() > 0.0 && bbox.height() > 0.0);
        let Some(bbox) = bbox else {
            #[cfg(feature = "tracing")]
            tracing::debug!("Deferring layout of text block {}: no geometry yet", block.root);
            return false;
        };

        let (width, height) = (bbox.width(), bbox.height());
        let options = &block.options;
        let offset = options.anchor.horizontal.offset(width);
        let shift = options.anchor.vertical.shift(height);
        let pad = block.padding();
        let (x, y) = (options.x, options.y);

        let group = block.root;
        let text = block.text;
        let background = block.background;
        let clip = block.clip.clone();
        let clip_attrs = options.clip.as_ref().map(|clip| clip.attrs.clone());

        if let Some(background) = background {
            self.apply_attributes(
                background,
                &crate::attrs! {
                    "width" => px(width + 2.0 * pad),
                    "height" => px(height + 2.0 * pad),
                },
            );
        }

        if let (Some(clip), Some(clip_attrs)) = (clip, clip_attrs) {
            let local = localize_clip(&clip_attrs, (x, y - shift));
            self.apply_attributes(clip.shape, &local);
            if let Some(backdrop) = clip.backdrop {
                let area = bbox.inflate(TEXT_PADDING, TEXT_PADDING);
                self.apply_attributes(
                    backdrop,
                    &crate::attrs! {
                        "x" => px(area.x0),
                        "y" => px(area.y0),
                        "width" => px(area.width()),
                        "height" => px(area.height()),
                    },
                );
            }
        }

        self.apply_attributes(
            text,
            &crate::attrs! { "transform" => translate(offset + pad, pad) },
        );
        self.apply_attributes(
            group,
            &crate::attrs! { "transform" => translate(x - offset - pad, y - shift - pad) },
        );

        let block = &mut self.text_blocks[key];
        block.width = Some(width);
        block.height = Some(height);
        block.offset = offset;
        block.shift = shift;
        block.state = if block.subscription.is_some() {
            TextBlockState::Attached
        } else {
            TextBlockState::LaidOut
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Laid out text block {} at ({}, {}) with size {}x{}",
            group,
            x,
            y,
            width,
            height
        );
        true
    }
}
