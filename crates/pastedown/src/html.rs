//! HTML parsing support.
//!
//! Parses an HTML (or plain text) payload into the [`Dom`] tree used by the
//! converter. Parsing is delegated to `scraper`/html5ever, which repairs
//! malformed markup on a best-effort basis, so the converter never sees a
//! parse error. A payload without any markup becomes a single text node.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::collapse::collapse_whitespace;
use crate::dom::{Dom, NodeId};

/// Parse an HTML string into a [`Dom`] tree.
///
/// The returned tree has already been whitespace-collapsed and is ready for
/// [`Converter::convert_dom`](crate::Converter::convert_dom).
///
/// # Example
///
/// ```rust
/// use pastedown::{parse_html, Converter};
///
/// let dom = parse_html("<h1>Hello <em>World</em></h1>");
/// let converter = Converter::new();
/// let markdown = converter.convert_dom(&dom);
/// assert!(markdown.contains("Hello"));
/// ```
pub fn parse_html(html: &str) -> Dom {
    let fragment = Html::parse_fragment(html);
    let mut dom = Dom::new();
    let root = dom.root();

    // parse_fragment wraps everything in a synthetic <html> element;
    // its children are the actual payload.
    append_children(&mut dom, root, fragment.root_element());

    collapse_whitespace(&mut dom);
    dom
}

/// Copy the children of a scraper element into the arena under `parent`.
fn append_children(dom: &mut Dom, parent: NodeId, element: ElementRef) {
    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                let id = dom.create_text(&text.text);
                dom.append(parent, id);
            }
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    let value = child_element.value();
                    let id = dom.create_element_with_attrs(value.name(), value.attrs());
                    dom.append(parent, id);
                    append_children(dom, id, child_element);
                }
            }
            ScraperNode::Comment(comment) => {
                let id = dom.create_comment(&comment.comment);
                dom.append(parent, id);
            }
            _ => {}
        }
    }
}
