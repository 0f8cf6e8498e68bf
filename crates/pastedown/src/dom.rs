//! Arena-backed DOM tree for HTML to Markdown conversion.
//!
//! The conversion engine is parser agnostic: any HTML parser can build a
//! [`Dom`] and hand it to the converter. Nodes are stored in a flat arena and
//! addressed by [`NodeId`], which gives every node a non-owning parent
//! back-reference without reference counting. The tree is acyclic by
//! construction: [`Dom::append`] only accepts detached nodes.

use crate::utilities::{is_block, is_void, is_meaningful_when_blank};

/// Index of a node inside its [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The kind of a DOM node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root container for a parsed payload
    Document,
    /// Element with a lowercase tag name and ordered attributes
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    /// Character data
    Text(String),
    /// Comment data (ignored by the converter, kept for fidelity)
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed content tree.
///
/// One `Dom` is produced per conversion call and does not outlive it.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeData>,
}

impl Dom {
    /// Create an empty tree containing only the document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element node. The tag name is lowercased.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_lowercase(),
            attrs: Vec::new(),
        })
    }

    /// Create a detached element node with attributes.
    pub fn create_element_with_attrs<'a, I>(&mut self, tag: &str, attrs: I) -> NodeId
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.push(NodeKind::Element {
            tag: tag.to_lowercase(),
            attrs: attrs
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value.to_string()))
                .collect(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.push(NodeKind::Text(data.to_string()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.push(NodeKind::Comment(data.to_string()))
    }

    /// Append a detached node as the last child of `parent`.
    ///
    /// Panics if `child` already has a parent; re-parenting is not supported,
    /// which keeps the tree acyclic.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.nodes[child.0].parent.is_none(),
            "node is already attached"
        );
        assert_ne!(parent, child, "node cannot be its own parent");
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach a node from its parent. The node stays in the arena but is no
    /// longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Replace the character data of a text node.
    pub(crate) fn set_text(&mut self, id: NodeId, data: String) {
        if let NodeKind::Text(text) = &mut self.nodes[id.0].kind {
            *text = data;
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// A borrowed view of one node, the unit rules and filters operate on.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dom: &'a Dom,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(dom: &'a Dom, id: NodeId) -> Self {
        Self { dom, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn dom(&self) -> &'a Dom {
        self.dom
    }

    pub fn kind(&self) -> &'a NodeKind {
        self.dom.kind(self.id)
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind(), NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind(), NodeKind::Text(_))
    }

    /// Tag name for elements, `None` otherwise.
    pub fn tag(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Get an attribute value by (case-insensitive) name.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Element { attrs, .. } => {
                let name = name.to_lowercase();
                attrs
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, v)| v.as_str())
            }
            _ => None,
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.dom.parent(self.id).map(|id| NodeRef::new(self.dom, id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + '_ {
        self.dom
            .children(self.id)
            .iter()
            .map(|id| NodeRef::new(self.dom, *id))
    }

    pub fn element_children(&self) -> impl Iterator<Item = NodeRef<'a>> + '_ {
        self.children().filter(|n| n.is_element())
    }

    pub fn first_element_child(&self) -> Option<NodeRef<'a>> {
        self.element_children().next()
    }

    /// The node immediately after this one in its parent's child list.
    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.dom.parent(self.id)?;
        let siblings = self.dom.children(parent);
        let pos = siblings.iter().position(|id| *id == self.id)?;
        siblings
            .get(pos + 1)
            .map(|id| NodeRef::new(self.dom, *id))
    }

    pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.dom.parent(self.id)?;
        let siblings = self.dom.children(parent);
        let pos = siblings.iter().position(|id| *id == self.id)?;
        pos.checked_sub(1)
            .and_then(|i| siblings.get(i))
            .map(|id| NodeRef::new(self.dom, *id))
    }

    /// The closest earlier sibling that is an element.
    pub fn previous_element_sibling(&self) -> Option<NodeRef<'a>> {
        let mut current = self.previous_sibling();
        while let Some(node) = current {
            if node.is_element() {
                return Some(node);
            }
            current = node.previous_sibling();
        }
        None
    }

    /// Zero-based position among the element children of the parent.
    pub fn element_index(&self) -> usize {
        match self.parent() {
            Some(parent) => parent
                .element_children()
                .position(|n| n.id == self.id)
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Whether this is the last element child of its parent.
    pub fn is_last_element_child(&self) -> bool {
        match self.parent() {
            Some(parent) => parent
                .element_children()
                .last()
                .map(|n| n.id == self.id)
                .unwrap_or(false),
            None => false,
        }
    }

    /// All descendants in document order, not including this node.
    pub fn descendants(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.dom.children(self.id).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(NodeRef::new(self.dom, id));
            stack.extend(self.dom.children(id).iter().rev());
        }
        out
    }

    /// Concatenated character data of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self.kind() {
            NodeKind::Text(data) => data.clone(),
            NodeKind::Comment(_) => String::new(),
            _ => self.children().map(|c| c.text_content()).collect(),
        }
    }

    pub fn is_block(&self) -> bool {
        self.tag().map(is_block).unwrap_or(false)
    }

    pub fn is_void(&self) -> bool {
        self.tag().map(is_void).unwrap_or(false)
    }

    /// True when this node or an ancestor is a `code` or `pre` element.
    pub fn in_code(&self) -> bool {
        let mut current = Some(*self);
        while let Some(node) = current {
            if matches!(node.tag(), Some("code") | Some("pre")) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// A node is blank when it renders to nothing: no visible text and no
    /// descendant that carries meaning on its own (images, line breaks,
    /// table cells, ...).
    pub fn is_blank(&self) -> bool {
        if self.is_void() {
            return false;
        }
        if self.tag().map(is_meaningful_when_blank).unwrap_or(false) {
            return false;
        }
        if !self.text_content().trim().is_empty() {
            return false;
        }
        !self.descendants().iter().any(|d| {
            d.is_void() || d.tag().map(is_meaningful_when_blank).unwrap_or(false)
        })
    }

    /// Reconstruct outer HTML, used by `keep` rules.
    pub fn outer_html(&self) -> String {
        match self.kind() {
            NodeKind::Text(data) => data.clone(),
            NodeKind::Comment(data) => format!("<!--{}-->", data),
            NodeKind::Element { tag, attrs } => {
                let attrs = attributes_string(attrs);
                if self.is_void() {
                    if attrs.is_empty() {
                        format!("<{}>", tag)
                    } else {
                        format!("<{} {}>", tag, attrs)
                    }
                } else if attrs.is_empty() {
                    format!("<{}>{}</{}>", tag, self.inner_html(), tag)
                } else {
                    format!("<{} {}>{}</{}>", tag, attrs, self.inner_html(), tag)
                }
            }
            NodeKind::Document => self.inner_html(),
        }
    }

    /// Reconstruct inner HTML.
    pub fn inner_html(&self) -> String {
        self.children().map(|c| c.outer_html()).collect()
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", self.kind())
            .finish()
    }
}

fn attributes_string(attrs: &[(String, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| {
            if value.is_empty() {
                name.clone()
            } else {
                format!("{}=\"{}\"", name, escape_html_attr(value))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_html_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let root = dom.root();
        dom.append(root, p);
        (dom, p)
    }

    #[test]
    fn test_create_element() {
        let (dom, p) = sample();
        let node = NodeRef::new(&dom, p);
        assert!(node.is_element());
        assert_eq!(node.tag(), Some("p"));
        assert_eq!(node.parent().map(|n| n.id()), Some(dom.root()));
    }

    #[test]
    fn test_tag_is_lowercased() {
        let mut dom = Dom::new();
        let div = dom.create_element("DIV");
        assert_eq!(NodeRef::new(&dom, div).tag(), Some("div"));
    }

    #[test]
    fn test_attributes() {
        let mut dom = Dom::new();
        let a = dom.create_element_with_attrs(
            "a",
            [("href", "https://example.com"), ("title", "Example")],
        );
        let node = NodeRef::new(&dom, a);
        assert_eq!(node.attr("href"), Some("https://example.com"));
        assert_eq!(node.attr("TITLE"), Some("Example"));
        assert_eq!(node.attr("class"), None);
    }

    #[test]
    fn test_text_content() {
        let (mut dom, p) = sample();
        let hello = dom.create_text("Hello ");
        dom.append(p, hello);
        let span = dom.create_element("span");
        dom.append(p, span);
        let world = dom.create_text("World");
        dom.append(span, world);

        assert_eq!(NodeRef::new(&dom, p).text_content(), "Hello World");
    }

    #[test]
    fn test_element_index_skips_text() {
        let (mut dom, p) = sample();
        let t = dom.create_text("x");
        dom.append(p, t);
        let em = dom.create_element("em");
        dom.append(p, em);
        let strong = dom.create_element("strong");
        dom.append(p, strong);

        assert_eq!(NodeRef::new(&dom, em).element_index(), 0);
        assert_eq!(NodeRef::new(&dom, strong).element_index(), 1);
        assert!(NodeRef::new(&dom, strong).is_last_element_child());
    }

    #[test]
    fn test_sibling_navigation() {
        let (mut dom, p) = sample();
        let t = dom.create_text("x");
        dom.append(p, t);
        let em = dom.create_element("em");
        dom.append(p, em);
        let strong = dom.create_element("strong");
        dom.append(p, strong);

        let strong_ref = NodeRef::new(&dom, strong);
        assert_eq!(strong_ref.previous_sibling().map(|n| n.id()), Some(em));
        assert_eq!(strong_ref.previous_element_sibling().map(|n| n.id()), Some(em));

        let em_ref = NodeRef::new(&dom, em);
        assert_eq!(em_ref.previous_sibling().map(|n| n.id()), Some(t));
        // the text node is skipped, and nothing precedes it
        assert!(em_ref.previous_element_sibling().is_none());
        assert!(NodeRef::new(&dom, t).previous_sibling().is_none());
    }

    #[test]
    fn test_detach() {
        let (mut dom, p) = sample();
        let t = dom.create_text("x");
        dom.append(p, t);
        assert_eq!(dom.children(p).len(), 1);
        dom.detach(t);
        assert!(dom.children(p).is_empty());
        assert_eq!(dom.parent(t), None);
    }

    #[test]
    fn test_is_blank() {
        let (mut dom, p) = sample();
        let t = dom.create_text("   \n ");
        dom.append(p, t);
        assert!(NodeRef::new(&dom, p).is_blank());

        let img = dom.create_element("img");
        dom.append(p, img);
        assert!(!NodeRef::new(&dom, p).is_blank());
    }

    #[test]
    fn test_outer_html() {
        let mut dom = Dom::new();
        let a = dom.create_element_with_attrs("a", [("href", "https://example.com")]);
        let root = dom.root();
        dom.append(root, a);
        let text = dom.create_text("Link");
        dom.append(a, text);

        assert_eq!(
            NodeRef::new(&dom, a).outer_html(),
            "<a href=\"https://example.com\">Link</a>"
        );

        let br = dom.create_element("br");
        assert_eq!(NodeRef::new(&dom, br).outer_html(), "<br>");
    }

    #[test]
    fn test_in_code() {
        let mut dom = Dom::new();
        let pre = dom.create_element("pre");
        let root = dom.root();
        dom.append(root, pre);
        let code = dom.create_element("code");
        dom.append(pre, code);
        let text = dom.create_text("x");
        dom.append(code, text);

        assert!(NodeRef::new(&dom, text).in_code());
        assert!(!NodeRef::new(&dom, pre).parent().unwrap().in_code());
    }
}
