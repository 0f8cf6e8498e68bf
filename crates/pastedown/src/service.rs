//! Converter - the main entry point for HTML to Markdown conversion.

use crate::dom::{Dom, NodeKind, NodeRef};
use crate::escape;
use crate::options::Options;
use crate::rules::{Filter, References, Rule, Rules};
#[cfg(feature = "html")]
use crate::Result;

/// The main service for converting a content tree to Markdown.
///
/// A converter owns one rule registry and one set of options, both fixed at
/// construction; conversion itself takes `&self`, so one converter can serve
/// any number of independent trees.
pub struct Converter {
    options: Options,
    rules: Rules,
}

impl Converter {
    /// Create a new converter with default options
    pub fn new() -> Self {
        Self {
            options: Options::default(),
            rules: Rules::new(),
        }
    }

    /// Create a converter with custom options
    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            rules: Rules::new(),
        }
    }

    /// Convert HTML to Markdown
    #[cfg(feature = "html")]
    pub fn convert(&self, html: &str) -> Result<String> {
        let dom = crate::html::parse_html(html);
        Ok(self.convert_dom(&dom))
    }

    /// Convert an already-parsed tree to Markdown
    pub fn convert_dom(&self, dom: &Dom) -> String {
        log::debug!("converting tree with {} nodes", dom.len());
        let root = NodeRef::new(dom, dom.root());
        let mut references = References::new();
        let mut output = self.process(root, false, &mut references);
        if !references.is_empty() {
            output = format!(
                "{}\n\n{}",
                output.trim_end_matches('\n'),
                references.render()
            );
        }
        escape::post_process(&output)
    }

    /// Add a custom rule
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Keep elements matching the filter as HTML
    pub fn keep(&mut self, filter: Filter) -> &mut Self {
        self.rules.keep(filter);
        self
    }

    /// Remove elements matching the filter
    pub fn remove(&mut self, filter: Filter) -> &mut Self {
        self.rules.remove(filter);
        self
    }

    /// Apply a plugin
    pub fn use_plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        plugin(self);
        self
    }

    /// Get the current options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Render the children of a node, joined with capped block separation.
    fn process(&self, node: NodeRef<'_>, in_code: bool, references: &mut References) -> String {
        let mut output = String::new();
        for child in node.children() {
            let rendered = match child.kind() {
                NodeKind::Text(data) => {
                    if in_code {
                        data.clone()
                    } else {
                        escape::escape(data)
                    }
                }
                NodeKind::Element { .. } => self.replacement_for(child, in_code, references),
                NodeKind::Comment(_) | NodeKind::Document => String::new(),
            };
            output = join(&output, &rendered);
        }
        output
    }

    /// Render one element: children first, then the resolved rule.
    fn replacement_for(
        &self,
        node: NodeRef<'_>,
        in_code: bool,
        references: &mut References,
    ) -> String {
        let child_in_code = in_code || matches!(node.tag(), Some("code") | Some("pre"));
        let content = self.process(node, child_in_code, references);
        let rule = self.rules.resolve(node, &self.options);

        if node.is_block() {
            return rule.replace(&content, node, &self.options, references);
        }

        // Hoist flanking whitespace outside inline delimiters so
        // "<em> x </em>" renders as " _x_ " rather than "_ x _".
        let (leading, trimmed, trailing) = flanking_whitespace(&content);
        let replaced = rule.replace(trimmed, node, &self.options, references);
        format!("{}{}{}", leading, replaced, trailing)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate two rendered fragments, capping the separation between them
/// at one blank line regardless of how many newlines each side asked for.
fn join(output: &str, replacement: &str) -> String {
    let s1 = output.trim_end_matches('\n');
    let s2 = replacement.trim_start_matches('\n');
    let newlines = (output.len() - s1.len()).max(replacement.len() - s2.len());
    format!("{}{}{}", s1, &"\n\n"[..newlines.min(2)], s2)
}

/// Split content into leading whitespace, core, and trailing whitespace,
/// collapsing each flank to at most a single space.
fn flanking_whitespace(content: &str) -> (&'static str, &str, &'static str) {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        let leading = if content.is_empty() { "" } else { " " };
        return (leading, "", "");
    }
    let leading = if content.starts_with(char::is_whitespace) {
        " "
    } else {
        ""
    };
    let trailing = if content.ends_with(char::is_whitespace) {
        " "
    } else {
        ""
    };
    (leading, trimmed, trailing)
}
