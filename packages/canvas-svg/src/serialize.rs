use std::fmt::Write;

use canvas_traits::{HostHandle, ns};

use crate::SvgDocument;
use crate::document::HostNodeKind;

impl SvgDocument {
    /// Serialize the subtree rooted at `el` as SVG markup.
    ///
    /// The outermost element gets `xmlns` declarations so the output stands alone.
    pub fn to_svg_string(&self, el: HostHandle) -> String {
        let mut out = String::new();
        self.write_node(el.0, true, &mut out);
        out
    }

    fn write_node(&self, id: usize, outermost: bool, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };

        let (namespace, tag) = match &node.kind {
            HostNodeKind::Text(text) => {
                out.push_str(&html_escape::encode_text(text));
                return;
            }
            HostNodeKind::Document => {
                for &child in &node.children {
                    self.write_node(child, true, out);
                }
                return;
            }
            HostNodeKind::Element { namespace, tag } => (namespace, tag),
        };

        let _ = write!(out, "<{tag}");
        if outermost && namespace == ns::SVG {
            let _ = write!(out, " xmlns=\"{}\" xmlns:xlink=\"{}\"", ns::SVG, ns::XLINK);
        }
        for attr in &node.attrs {
            let _ = write!(
                out,
                " {}=\"{}\"",
                self.qualified_name(attr),
                html_escape::encode_double_quoted_attribute(&attr.value)
            );
        }

        if node.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for &child in &node.children {
            self.write_node(child, false, out);
        }
        let _ = write!(out, "</{tag}>");
    }
}

#[cfg(test)]
mod tests {
    use canvas_traits::{HostSurface, ns};

    use crate::SvgDocument;

    #[test]
    fn escapes_text_and_attributes() {
        let mut doc = SvgDocument::new();
        let svg = doc.create_element(ns::SVG, "svg");
        let link = doc.create_element(ns::SVG, "a");
        doc.set_attribute(link, Some(ns::XLINK), "href", "http://x/?a=1&b=\"2\"");
        doc.set_text_content(link, "<b> & co");
        doc.append_child(svg, link);

        assert_eq!(
            doc.to_svg_string(svg),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\">\
             <a xlink:href=\"http://x/?a=1&amp;b=&quot;2&quot;\">&lt;b&gt; &amp; co</a></svg>"
        );
    }

    #[test]
    fn empty_elements_self_close() {
        let mut doc = SvgDocument::new();
        let rect = doc.create_element(ns::SVG, "rect");
        doc.set_attribute(rect, None, "width", "3");
        assert!(doc.to_svg_string(rect).ends_with(" width=\"3\"/>"));
    }
}
