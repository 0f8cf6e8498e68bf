//! Rule registry and resolution.
//!
//! Every element in the tree resolves to exactly one rule. Resolution order:
//! blank nodes first, then user-added rules in insertion order, then the
//! built-in CommonMark rules, then `keep`/`remove` filters, and finally the
//! default rule, which passes content through (block-wrapped for block
//! elements). Resolution is total: no element falls through.

mod commonmark;
mod gfm;
mod rule;

pub use gfm::gfm;
pub use rule::{Filter, FilterFn, References, ReplacementFn, Rule};

use indexmap::IndexMap;

use crate::dom::NodeRef;
use crate::options::Options;

/// Elements removed outright unless a user rule claims them first.
const DEFAULT_REMOVE: &[&str] = &["head", "script", "style", "noscript", "template", "title"];

/// The full rule set used by one converter.
pub struct Rules {
    custom: IndexMap<String, Rule>,
    builtins: Vec<Rule>,
    keep_filters: Vec<Filter>,
    remove_filters: Vec<Filter>,
    blank_rule: Rule,
    keep_rule: Rule,
    remove_rule: Rule,
    default_rule: Rule,
}

impl Rules {
    pub fn new() -> Self {
        Self {
            custom: IndexMap::new(),
            builtins: commonmark::rules(),
            keep_filters: Vec::new(),
            remove_filters: vec![Filter::tags(DEFAULT_REMOVE)],
            // Blank elements still contribute block separation.
            blank_rule: Rule::new(Filter::predicate(|_, _| true), |_, node, _, _| {
                if node.is_block() {
                    "\n\n".to_string()
                } else {
                    String::new()
                }
            }),
            keep_rule: Rule::new(Filter::predicate(|_, _| true), |_, node, _, _| {
                if node.is_block() {
                    format!("\n\n{}\n\n", node.outer_html())
                } else {
                    node.outer_html()
                }
            }),
            remove_rule: Rule::new(Filter::predicate(|_, _| true), |_, _, _, _| String::new()),
            default_rule: Rule::new(Filter::predicate(|_, _| true), |content, node, _, _| {
                if node.is_block() {
                    format!("\n\n{}\n\n", content)
                } else {
                    content.to_string()
                }
            }),
        }
    }

    /// Register a named rule. Re-using a name replaces the earlier rule while
    /// keeping its position in resolution order.
    pub fn add(&mut self, name: &str, rule: Rule) {
        self.custom.insert(name.to_string(), rule);
    }

    /// Keep matched elements as raw HTML.
    pub fn keep(&mut self, filter: Filter) {
        self.keep_filters.push(filter);
    }

    /// Drop matched elements and everything under them.
    pub fn remove(&mut self, filter: Filter) {
        self.remove_filters.push(filter);
    }

    /// Find the rule for an element. Always succeeds.
    pub fn resolve(&self, node: NodeRef<'_>, options: &Options) -> &Rule {
        if node.is_blank() {
            return &self.blank_rule;
        }
        for rule in self.custom.values() {
            if rule.filter.matches(node, options) {
                return rule;
            }
        }
        for rule in &self.builtins {
            if rule.filter.matches(node, options) {
                return rule;
            }
        }
        if self.keep_filters.iter().any(|f| f.matches(node, options)) {
            return &self.keep_rule;
        }
        if self.remove_filters.iter().any(|f| f.matches(node, options)) {
            return &self.remove_rule;
        }
        &self.default_rule
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
