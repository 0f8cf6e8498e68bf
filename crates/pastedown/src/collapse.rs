//! DOM-level whitespace collapsing.
//!
//! Runs once over a freshly parsed tree, before rendering. Whitespace runs
//! in text nodes become single spaces, and spaces that would be invisible in
//! rendered HTML (at block boundaries, between a block and its first text)
//! are dropped entirely. `pre` subtrees are left untouched.

use crate::dom::{Dom, NodeId, NodeKind};
use crate::utilities::{is_block, is_void};

/// Collapse whitespace across the whole tree, in place.
pub fn collapse_whitespace(dom: &mut Dom) {
    let root = dom.root();
    if dom.children(root).is_empty() {
        return;
    }

    // Last text node seen since the previous block boundary.
    let mut prev_text: Option<NodeId> = None;
    let mut keep_leading_ws = false;

    let mut prev: Option<NodeId> = None;
    let mut node = next_node(dom, prev, root);

    while node != root {
        match dom.kind(node) {
            NodeKind::Text(data) => {
                let mut text = collapse_runs(data);
                let prev_ends_space = prev_text
                    .map(|id| text_data(dom, id).ends_with(' '))
                    .unwrap_or(true);
                if text.starts_with(' ') && prev_ends_space && !keep_leading_ws {
                    text.remove(0);
                }
                if text.is_empty() {
                    node = remove_node(dom, node);
                    continue;
                }
                dom.set_text(node, text);
                prev_text = Some(node);
            }
            NodeKind::Element { tag, .. } => {
                if is_block(tag) || tag == "br" {
                    if let Some(id) = prev_text {
                        trim_trailing_space(dom, id);
                    }
                    prev_text = None;
                    keep_leading_ws = false;
                } else if is_void(tag) || tag == "pre" {
                    prev_text = None;
                    keep_leading_ws = true;
                } else if prev_text.is_some() {
                    keep_leading_ws = false;
                }
            }
            // Comments are invisible; they separate nothing.
            NodeKind::Comment(_) | NodeKind::Document => {}
        }

        let next = next_node(dom, prev, node);
        prev = Some(node);
        node = next;
    }

    if let Some(id) = prev_text {
        trim_trailing_space(dom, id);
        if text_data(dom, id).is_empty() {
            dom.detach(id);
        }
    }
}

/// Document-order successor. Descends into children unless we just came up
/// from one, or the current node is preformatted. Climbing back out revisits
/// ancestors, which is what trims trailing spaces at block boundaries.
fn next_node(dom: &Dom, prev: Option<NodeId>, current: NodeId) -> NodeId {
    let came_from_child = prev.map_or(false, |p| dom.parent(p) == Some(current));
    if came_from_child || is_pre(dom, current) {
        return sibling_or_parent(dom, current);
    }
    match dom.children(current).first() {
        Some(first) => *first,
        None => sibling_or_parent(dom, current),
    }
}

fn sibling_or_parent(dom: &Dom, id: NodeId) -> NodeId {
    next_sibling(dom, id)
        .or_else(|| dom.parent(id))
        .expect("walk cannot escape the root")
}

fn next_sibling(dom: &Dom, id: NodeId) -> Option<NodeId> {
    let parent = dom.parent(id)?;
    let siblings = dom.children(parent);
    let pos = siblings.iter().position(|c| *c == id)?;
    siblings.get(pos + 1).copied()
}

fn remove_node(dom: &mut Dom, id: NodeId) -> NodeId {
    let next = sibling_or_parent(dom, id);
    dom.detach(id);
    next
}

fn is_pre(dom: &Dom, id: NodeId) -> bool {
    matches!(dom.kind(id), NodeKind::Element { tag, .. } if tag == "pre")
}

fn text_data<'a>(dom: &'a Dom, id: NodeId) -> &'a str {
    match dom.kind(id) {
        NodeKind::Text(data) => data,
        _ => "",
    }
}

fn trim_trailing_space(dom: &mut Dom, id: NodeId) {
    if let Some(stripped) = text_data(dom, id).strip_suffix(' ') {
        let stripped = stripped.to_string();
        dom.set_text(id, stripped);
    }
}

/// Replace every run of whitespace with a single space.
fn collapse_runs(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_whitespace = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeRef;

    fn text_of(dom: &Dom, id: NodeId) -> String {
        NodeRef::new(dom, id).text_content()
    }

    #[test]
    fn test_collapse_runs() {
        assert_eq!(collapse_runs("a  b\n\tc"), "a b c");
        assert_eq!(collapse_runs("  "), " ");
    }

    #[test]
    fn test_trims_block_edges() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.create_element("p");
        dom.append(root, p);
        let t = dom.create_text("  Hello   World  ");
        dom.append(p, t);

        collapse_whitespace(&mut dom);
        assert_eq!(text_of(&dom, p), "Hello World");
    }

    #[test]
    fn test_space_between_inline_elements_survives() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.create_element("p");
        dom.append(root, p);
        let a = dom.create_text("a ");
        dom.append(p, a);
        let em = dom.create_element("em");
        dom.append(p, em);
        let b = dom.create_text(" b ");
        dom.append(em, b);
        let c = dom.create_text(" c");
        dom.append(p, c);

        collapse_whitespace(&mut dom);
        assert_eq!(text_of(&dom, a), "a ");
        // leading space is redundant after "a ", trailing survives inline
        assert_eq!(text_of(&dom, b), "b ");
        assert_eq!(text_of(&dom, c), "c");
    }

    #[test]
    fn test_whitespace_only_node_between_blocks_removed() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p1 = dom.create_element("p");
        dom.append(root, p1);
        let t1 = dom.create_text("one");
        dom.append(p1, t1);
        let gap = dom.create_text("\n  ");
        dom.append(root, gap);
        let p2 = dom.create_element("p");
        dom.append(root, p2);
        let t2 = dom.create_text("two");
        dom.append(p2, t2);

        collapse_whitespace(&mut dom);
        assert_eq!(dom.parent(gap), None);
    }

    #[test]
    fn test_pre_untouched() {
        let mut dom = Dom::new();
        let root = dom.root();
        let pre = dom.create_element("pre");
        dom.append(root, pre);
        let code = dom.create_element("code");
        dom.append(pre, code);
        let t = dom.create_text("line one\n    indented\n");
        dom.append(code, t);

        collapse_whitespace(&mut dom);
        assert_eq!(text_of(&dom, t), "line one\n    indented\n");
    }
}
