//! GitHub Flavored Markdown extensions: tables, task list items,
//! strikethrough and highlighted code blocks.
//!
//! Apply with [`Converter::use_plugin`](crate::Converter::use_plugin):
//!
//! ```rust
//! use pastedown::{gfm, Converter};
//!
//! let mut converter = Converter::new();
//! converter.use_plugin(gfm);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::NodeRef;
use crate::rules::commonmark::fence_code;
use crate::rules::rule::{Filter, Rule};
use crate::service::Converter;

static HIGHLIGHT_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"highlight-(?:text|source)-([a-z0-9]+)").unwrap());

/// Register the GFM rule set on a converter.
pub fn gfm(converter: &mut Converter) {
    converter.add_rule("tableCell", table_cell());
    converter.add_rule("tableRow", table_row());
    converter.add_rule("tableSection", table_section());
    converter.add_rule("table", table());
    converter.add_rule("taskListItems", task_list_items());
    converter.add_rule("strikethrough", strikethrough());
    converter.add_rule("highlightedCodeBlock", highlighted_code_block());
}

/// A row renders as a heading row when it sits in a `thead`, or when it is
/// the first row of the table (or of a leading `tbody`) and every cell is a
/// `th`.
fn is_heading_row(row: NodeRef<'_>) -> bool {
    let Some(parent) = row.parent() else {
        return false;
    };
    if parent.tag() == Some("thead") {
        return true;
    }
    let first_row = parent.first_element_child().map(|n| n.id()) == Some(row.id());
    first_row
        && (parent.tag() == Some("table") || is_first_tbody(parent))
        && row.element_children().all(|cell| cell.tag() == Some("th"))
}

fn is_first_tbody(section: NodeRef<'_>) -> bool {
    if section.tag() != Some("tbody") {
        return false;
    }
    match section.previous_element_sibling() {
        None => true,
        Some(prev) => prev.tag() == Some("thead") && prev.text_content().trim().is_empty(),
    }
}

/// Render one cell of a row. The first cell carries the left border.
fn cell(content: &str, node: NodeRef<'_>) -> String {
    let prefix = if node.element_index() == 0 { "| " } else { " " };
    let content = content.trim().replace('\n', " ").replace('|', "\\|");
    format!("{}{} |", prefix, content)
}

fn table_cell() -> Rule {
    Rule::for_tags(&["th", "td"], |content, node, _, _| cell(content, node))
}

fn table_row() -> Rule {
    Rule::for_tag("tr", |content, node, _, _| {
        let mut border_cells = String::new();
        if is_heading_row(node) {
            for head in node.element_children() {
                let border = match head.attr("align").map(str::to_lowercase).as_deref() {
                    Some("left") => ":--",
                    Some("right") => "--:",
                    Some("center") => ":-:",
                    _ => "---",
                };
                border_cells.push_str(&cell(border, head));
            }
        }
        if border_cells.is_empty() {
            format!("\n{}", content)
        } else {
            format!("\n{}\n{}", content, border_cells)
        }
    })
}

fn table_section() -> Rule {
    Rule::for_tags(&["thead", "tbody", "tfoot"], |content, _, _, _| {
        content.to_string()
    })
}

fn table() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| {
            // Only tables whose first row is a heading row translate; anything
            // else has no GFM equivalent and falls through.
            node.tag() == Some("table")
                && node
                    .descendants()
                    .into_iter()
                    .find(|d| d.tag() == Some("tr"))
                    .map(is_heading_row)
                    .unwrap_or(false)
        }),
        |content, _, _, _| {
            // The section boundary leaves one blank line inside the table.
            let content = content.replacen("\n\n", "\n", 1);
            format!("\n\n{}\n\n", content)
        },
    )
}

fn task_list_items() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| {
            node.tag() == Some("input")
                && node.attr("type").map(str::to_lowercase).as_deref() == Some("checkbox")
                && node.parent().and_then(|p| p.tag().map(|t| t == "li")) == Some(true)
        }),
        |_, node, _, _| {
            if node.has_attr("checked") {
                "[x] ".to_string()
            } else {
                "[ ] ".to_string()
            }
        },
    )
}

fn strikethrough() -> Rule {
    Rule::for_tags(&["del", "s", "strike"], |content, _, _, _| {
        if content.trim().is_empty() {
            return String::new();
        }
        format!("~~{}~~", content)
    })
}

/// GitHub wraps highlighted source in `<div class="highlight-source-js">`
/// around a bare `pre`; the class carries the language.
fn highlighted_code_block() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| {
            node.tag() == Some("div")
                && node
                    .attr("class")
                    .map(|class| HIGHLIGHT_CLASS.is_match(class))
                    .unwrap_or(false)
                && node.first_element_child().map(|c| c.tag() == Some("pre")) == Some(true)
        }),
        |_, node, options, _| {
            let language = node
                .attr("class")
                .and_then(|class| HIGHLIGHT_CLASS.captures(class))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let code = match node.first_element_child() {
                Some(pre) => pre.text_content(),
                None => String::new(),
            };
            format!("\n\n{}\n\n", fence_code(&code, &language, options))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;
    use crate::options::Options;
    use crate::rules::rule::References;

    fn table_fixture() -> (Dom, crate::dom::NodeId, crate::dom::NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        let table = dom.create_element("table");
        dom.append(root, table);
        let tr = dom.create_element("tr");
        dom.append(table, tr);
        let th1 = dom.create_element("th");
        dom.append(tr, th1);
        let th2 = dom.create_element_with_attrs("th", [("align", "right")]);
        dom.append(tr, th2);
        (dom, tr, th1)
    }

    #[test]
    fn test_heading_row_detection() {
        let (dom, tr, _) = table_fixture();
        assert!(is_heading_row(NodeRef::new(&dom, tr)));
    }

    #[test]
    fn test_leading_tbody_row_counts_as_heading_row() {
        let mut dom = Dom::new();
        let root = dom.root();
        let table = dom.create_element("table");
        dom.append(root, table);
        let tbody = dom.create_element("tbody");
        dom.append(table, tbody);
        let tr = dom.create_element("tr");
        dom.append(tbody, tr);
        let th = dom.create_element("th");
        dom.append(tr, th);

        assert!(is_heading_row(NodeRef::new(&dom, tr)));

        // a second tbody is not a heading candidate
        let tbody2 = dom.create_element("tbody");
        dom.append(table, tbody2);
        let tr2 = dom.create_element("tr");
        dom.append(tbody2, tr2);
        let th2 = dom.create_element("th");
        dom.append(tr2, th2);
        assert!(!is_heading_row(NodeRef::new(&dom, tr2)));
    }

    #[test]
    fn test_cell_borders() {
        let (dom, _, th1) = table_fixture();
        let node = NodeRef::new(&dom, th1);
        assert_eq!(cell("Name", node), "| Name |");
        assert_eq!(cell("a|b", node), "| a\\|b |");
    }

    #[test]
    fn test_heading_row_emits_separator_with_alignment() {
        let (dom, tr, _) = table_fixture();
        let options = Options::default();
        let mut refs = References::new();
        let rendered = table_row().replace(
            "| A | B |",
            NodeRef::new(&dom, tr),
            &options,
            &mut refs,
        );
        assert_eq!(rendered, "\n| A | B |\n| --- | --: |");
    }

    #[test]
    fn test_task_list_marker() {
        let mut dom = Dom::new();
        let root = dom.root();
        let li = dom.create_element("li");
        dom.append(root, li);
        let unchecked = dom.create_element_with_attrs("input", [("type", "checkbox")]);
        dom.append(li, unchecked);
        let checked = dom.create_element_with_attrs("input", [("type", "checkbox"), ("checked", "")]);
        dom.append(li, checked);

        let options = Options::default();
        let mut refs = References::new();
        let rule = task_list_items();
        assert_eq!(
            rule.replace("", NodeRef::new(&dom, unchecked), &options, &mut refs),
            "[ ] "
        );
        assert_eq!(
            rule.replace("", NodeRef::new(&dom, checked), &options, &mut refs),
            "[x] "
        );
    }

    #[test]
    fn test_strikethrough() {
        let mut dom = Dom::new();
        let root = dom.root();
        let del = dom.create_element("del");
        dom.append(root, del);

        let options = Options::default();
        let mut refs = References::new();
        assert_eq!(
            strikethrough().replace("old", NodeRef::new(&dom, del), &options, &mut refs),
            "~~old~~"
        );
    }

    #[test]
    fn test_highlighted_code_block_language() {
        let mut dom = Dom::new();
        let root = dom.root();
        let div = dom.create_element_with_attrs("div", [("class", "highlight-source-js")]);
        dom.append(root, div);
        let pre = dom.create_element("pre");
        dom.append(div, pre);
        let text = dom.create_text("var x = 1;\n");
        dom.append(pre, text);

        let options = Options::default();
        let mut refs = References::new();
        let rendered =
            highlighted_code_block().replace("", NodeRef::new(&dom, div), &options, &mut refs);
        assert_eq!(rendered, "\n\n```js\nvar x = 1;\n```\n\n");
    }
}
