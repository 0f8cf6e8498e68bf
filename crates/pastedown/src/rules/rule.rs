//! Rule and Filter types, plus deferred reference-link state.

use indexmap::IndexMap;

use crate::dom::NodeRef;
use crate::options::{LinkReferenceStyle, Options};

/// Type alias for replacement functions.
///
/// A replacement receives the already-rendered Markdown of the node's
/// children, the node itself, the conversion options, and the deferred
/// reference collector.
pub type ReplacementFn =
    Box<dyn Fn(&str, NodeRef<'_>, &Options, &mut References) -> String + Send + Sync>;

/// Type alias for filter predicates.
pub type FilterFn = Box<dyn Fn(NodeRef<'_>, &Options) -> bool + Send + Sync>;

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate function
    Predicate(FilterFn),
}

impl Filter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(NodeRef<'_>, &Options) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches an element
    pub fn matches(&self, node: NodeRef<'_>, options: &Options) -> bool {
        match self {
            Filter::TagName(t) => node.tag() == Some(t.as_str()),
            Filter::TagNames(tags) => node
                .tag()
                .map(|tag| tags.iter().any(|t| t == tag))
                .unwrap_or(false),
            Filter::Predicate(f) => f(node, options),
        }
    }
}

/// A rule defines how to convert a matched element to Markdown
pub struct Rule {
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    /// Replacement function that generates Markdown
    pub replacement: ReplacementFn,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&str, NodeRef<'_>, &Options, &mut References) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Box::new(replacement),
        }
    }

    /// Create a rule that matches a single tag
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: Fn(&str, NodeRef<'_>, &Options, &mut References) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), replacement)
    }

    /// Create a rule that matches multiple tags
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: Fn(&str, NodeRef<'_>, &Options, &mut References) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), replacement)
    }

    /// Apply this rule's replacement
    pub fn replace(
        &self,
        content: &str,
        node: NodeRef<'_>,
        options: &Options,
        references: &mut References,
    ) -> String {
        (self.replacement)(content, node, options, references)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReferenceKey {
    url: String,
    title: Option<String>,
    /// Set for collapsed/shortcut styles, where the link text is the label
    /// and therefore part of the definition's identity.
    label: Option<String>,
}

#[derive(Debug, Clone)]
struct Reference {
    label: String,
    url: String,
    title: Option<String>,
}

/// Deferred reference-link definitions, collected during the render pass and
/// appended once after the body.
///
/// Definitions are deduplicated by (url, title) in first-seen order: two
/// links sharing a target produce one definition referenced by both.
#[derive(Default)]
pub struct References {
    entries: IndexMap<ReferenceKey, Reference>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one reference-style link, registering its definition.
    /// Returns the inline markup for the link occurrence.
    pub fn link(
        &mut self,
        content: &str,
        url: &str,
        title: Option<&str>,
        style: LinkReferenceStyle,
    ) -> String {
        match style {
            LinkReferenceStyle::Full => {
                let key = ReferenceKey {
                    url: url.to_string(),
                    title: title.map(str::to_string),
                    label: None,
                };
                let next_label = (self.entries.len() + 1).to_string();
                let entry = self.entries.entry(key).or_insert_with(|| Reference {
                    label: next_label,
                    url: url.to_string(),
                    title: title.map(str::to_string),
                });
                format!("[{}][{}]", content, entry.label)
            }
            LinkReferenceStyle::Collapsed | LinkReferenceStyle::Shortcut => {
                let key = ReferenceKey {
                    url: url.to_string(),
                    title: title.map(str::to_string),
                    label: Some(content.to_string()),
                };
                self.entries.entry(key).or_insert_with(|| Reference {
                    label: content.to_string(),
                    url: url.to_string(),
                    title: title.map(str::to_string),
                });
                if style == LinkReferenceStyle::Collapsed {
                    format!("[{}][]", content)
                } else {
                    format!("[{}]", content)
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All definitions in first-seen order, one per line.
    pub fn render(&self) -> String {
        self.entries
            .values()
            .map(|r| match &r.title {
                Some(title) => format!("[{}]: {} \"{}\"", r.label, r.url, title),
                None => format!("[{}]: {}", r.label, r.url),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
