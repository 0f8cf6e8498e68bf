//! Built-in CommonMark rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::NodeRef;
use crate::escape::{HARD_BREAK_MARK, LINE_START_MARK};
use crate::options::{CodeBlockStyle, HeadingStyle, LinkStyle, Options};
use crate::rules::rule::{Filter, Rule};
use crate::utilities::clean_attribute;

static CODE_LANGUAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"language-(\S+)").unwrap());

/// The built-in rule set, in resolution order.
pub(super) fn rules() -> Vec<Rule> {
    vec![
        paragraph(),
        line_break(),
        heading(),
        blockquote(),
        list(),
        list_item(),
        indented_code_block(),
        fenced_code_block(),
        preformatted(),
        horizontal_rule(),
        inline_link(),
        reference_link(),
        emphasis(),
        strong(),
        code(),
        image(),
    ]
}

fn paragraph() -> Rule {
    Rule::for_tag("p", |content, _, _, _| {
        format!("\n\n{}\n\n", content.trim_matches('\n'))
    })
}

fn line_break() -> Rule {
    // The marker survives line-level whitespace trimming and becomes a
    // two-space hard break in the final pass.
    Rule::for_tag("br", |_, _, _, _| format!("{HARD_BREAK_MARK}\n"))
}

fn heading() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |content, node, options, _| {
        let level = node
            .tag()
            .and_then(|t| t[1..].parse::<usize>().ok())
            .unwrap_or(1);
        let content = content.trim_matches('\n');
        if options.heading_style == HeadingStyle::Setext && level < 3 {
            let underline_char = if level == 1 { '=' } else { '-' };
            let width = content
                .chars()
                .filter(|c| *c != LINE_START_MARK && *c != HARD_BREAK_MARK)
                .count()
                .max(1);
            let underline: String = std::iter::repeat(underline_char).take(width).collect();
            format!("\n\n{}\n{}\n\n", content, underline)
        } else {
            format!("\n\n{} {}\n\n", "#".repeat(level), content)
        }
    })
}

fn blockquote() -> Rule {
    Rule::for_tag("blockquote", |content, _, _, _| {
        let quoted = content
            .trim_matches('\n')
            .split('\n')
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\n\n{}\n\n", quoted)
    })
}

fn list() -> Rule {
    Rule::for_tags(&["ul", "ol"], |content, node, _, _| {
        let parent_is_item = node.parent().and_then(|p| p.tag().map(|t| t == "li")) == Some(true);
        if parent_is_item && node.is_last_element_child() {
            // Nested list: the item prefix indentation was already applied by
            // the enclosing list item.
            format!("\n{}", content)
        } else {
            format!("\n\n{}\n\n", content)
        }
    })
}

fn list_item() -> Rule {
    Rule::for_tag("li", |content, node, options, _| {
        let prefix = match node.parent() {
            Some(parent) if parent.tag() == Some("ol") => {
                let start: i64 = parent
                    .attr("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                format!("{}. ", start.saturating_add(node.element_index() as i64))
            }
            _ => format!("{} ", options.bullet_list_marker),
        };

        // Continuation lines indent by the prefix width so nested content
        // lines up under the item text.
        let indent: String = " ".repeat(prefix.chars().count());
        let content = content.trim_start_matches('\n');
        let trailing_newlines = content.len() - content.trim_end_matches('\n').len();
        let content = if trailing_newlines > 0 {
            format!("{}\n", content.trim_end_matches('\n'))
        } else {
            content.to_string()
        };
        let content = content.replace('\n', &format!("\n{}", indent));

        let mut item = format!("{}{}", prefix, content);
        if node.next_sibling().is_some() && !item.ends_with('\n') {
            item.push('\n');
        }
        item
    })
}

fn is_code_block(node: NodeRef<'_>) -> bool {
    node.tag() == Some("pre")
        && node
            .first_element_child()
            .map(|c| c.tag() == Some("code"))
            .unwrap_or(false)
}

fn indented_code_block() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            options.code_block_style == CodeBlockStyle::Indented && is_code_block(node)
        }),
        |_, node, _, _| {
            let code = match node.first_element_child() {
                Some(code) => code.text_content(),
                None => String::new(),
            };
            format!("\n\n{}\n\n", indent_code(&code))
        },
    )
}

fn fenced_code_block() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            options.code_block_style == CodeBlockStyle::Fenced && is_code_block(node)
        }),
        |_, node, options, _| {
            let (code, language) = match node.first_element_child() {
                Some(code) => (code.text_content(), language_of(code)),
                None => (String::new(), String::new()),
            };
            format!("\n\n{}\n\n", fence_code(&code, &language, options))
        },
    )
}

/// A `pre` without a `code` child still renders as a code block; terminal
/// output and ASCII diagrams are usually pasted this way.
fn preformatted() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| node.tag() == Some("pre") && !is_code_block(node)),
        |_, node, options, _| {
            let code = node.text_content();
            let block = match options.code_block_style {
                CodeBlockStyle::Fenced => fence_code(&code, "", options),
                CodeBlockStyle::Indented => indent_code(&code),
            };
            format!("\n\n{}\n\n", block)
        },
    )
}

fn language_of(code: NodeRef<'_>) -> String {
    code.attr("class")
        .and_then(|class| CODE_LANGUAGE.captures(class))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn indent_code(code: &str) -> String {
    code.trim_end_matches('\n')
        .split('\n')
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a fence long enough that no line of the code can close it early.
pub(super) fn fence_code(code: &str, language: &str, options: &Options) -> String {
    let fence_char = options.fence.chars().next().unwrap_or('`');
    let longest_run = code
        .trim_end_matches('\n')
        .split('\n')
        .map(|line| line.chars().take_while(|c| *c == fence_char).count())
        .max()
        .unwrap_or(0);
    let fence: String = std::iter::repeat(fence_char)
        .take(longest_run.max(2) + 1)
        .collect();
    format!(
        "{}{}\n{}\n{}",
        fence,
        language,
        code.trim_end_matches('\n'),
        fence
    )
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, options, _| format!("\n\n{}\n\n", options.hr))
}

fn is_link(node: NodeRef<'_>) -> bool {
    node.tag() == Some("a") && node.has_attr("href")
}

fn inline_link() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            options.link_style == LinkStyle::Inlined && is_link(node)
        }),
        |content, node, _, _| {
            let href = clean_attribute(node.attr("href"))
                .replace('(', "\\(")
                .replace(')', "\\)");
            let title = clean_attribute(node.attr("title"));
            if title.is_empty() {
                format!("[{}]({})", content, href)
            } else {
                format!("[{}]({} \"{}\")", content, href, title.replace('"', "\\\""))
            }
        },
    )
}

fn reference_link() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            options.link_style == LinkStyle::Referenced && is_link(node)
        }),
        |content, node, options, references| {
            let href = clean_attribute(node.attr("href"));
            let title = clean_attribute(node.attr("title"));
            let title = (!title.is_empty()).then_some(title);
            references.link(content, &href, title.as_deref(), options.link_reference_style)
        },
    )
}

fn emphasis() -> Rule {
    Rule::for_tags(&["em", "i"], |content, _, options, _| {
        if content.trim().is_empty() {
            return String::new();
        }
        format!("{}{}{}", options.em_delimiter, content, options.em_delimiter)
    })
}

fn strong() -> Rule {
    Rule::for_tags(&["strong", "b"], |content, _, options, _| {
        if content.trim().is_empty() {
            return String::new();
        }
        format!("{}{}{}", options.strong_delimiter, content, options.strong_delimiter)
    })
}

fn code() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| {
            node.tag() == Some("code")
                && node.parent().and_then(|p| p.tag().map(|t| t == "pre")) != Some(true)
        }),
        |content, _, _, _| {
            if content.is_empty() {
                return String::new();
            }
            let content = content.replace(['\n', '\r'], " ");

            // The delimiter must be longer than any backtick run inside.
            let longest_run = longest_char_run(&content, '`');
            let delimiter = "`".repeat(longest_run + 1);
            let pad = if content.starts_with('`')
                || content.ends_with('`')
                || (content.starts_with(' ') && content.ends_with(' ') && content.trim() != "")
            {
                " "
            } else {
                ""
            };
            format!("{delimiter}{pad}{content}{pad}{delimiter}")
        },
    )
}

fn longest_char_run(s: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in s.chars() {
        if c == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn image() -> Rule {
    Rule::for_tag("img", |_, node, _, _| {
        let src = clean_attribute(node.attr("src"));
        if src.is_empty() {
            return String::new();
        }
        let alt = clean_attribute(node.attr("alt"));
        let title = clean_attribute(node.attr("title"));
        if title.is_empty() {
            format!("![{}]({})", alt, src)
        } else {
            format!("![{}]({} \"{}\")", alt, src, title)
        }
    })
}
