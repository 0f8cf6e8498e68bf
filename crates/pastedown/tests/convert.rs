//! End-to-end conversion tests through the public API.

use pastedown::{paste, Converter, LinkStyle, Options};

#[test]
fn plain_text_converts_to_itself() {
    assert_eq!(paste("plain words", false).unwrap(), "plain words\n");
}

#[test]
fn empty_payload_converts_to_empty_string() {
    assert_eq!(paste("", false).unwrap(), "");
    assert_eq!(paste("  \n\t ", false).unwrap(), "");
}

#[test]
fn simple_inline_markup() {
    assert_eq!(
        paste("<p>Hello <strong>world</strong></p>", false).unwrap(),
        "Hello **world**\n"
    );
}

#[test]
fn paste_defaults_use_atx_and_dashes() {
    assert_eq!(paste("<h2>Title</h2>", false).unwrap(), "## Title\n");
    assert_eq!(
        paste("<ul><li>one</li><li>two</li></ul>", false).unwrap(),
        "- one\n- two\n"
    );
    assert_eq!(paste("<em>x</em>", false).unwrap(), "*x*\n");
}

#[test]
fn nested_list_indents_by_prefix_width() {
    assert_eq!(
        paste("<ul><li>a<ul><li>b</li></ul></li></ul>", false).unwrap(),
        "- a\n  - b\n"
    );
    assert_eq!(
        paste("<ol><li>a<ol><li>b</li></ol></li></ol>", false).unwrap(),
        "1. a\n   1. b\n"
    );
}

#[test]
fn ordered_list_respects_start_attribute() {
    assert_eq!(
        paste(r#"<ol start="3"><li>c</li><li>d</li></ol>"#, false).unwrap(),
        "3. c\n4. d\n"
    );
}

#[test]
fn absurd_ordered_list_start_saturates_instead_of_overflowing() {
    let html = r#"<ol start="9223372036854775807"><li>a</li><li>b</li></ol>"#;
    let expected = format!("{max}. a\n{max}. b\n", max = i64::MAX);
    assert_eq!(paste(html, false).unwrap(), expected);
}

#[test]
fn table_shape_preserved_with_escaped_pipes() {
    let html = "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
                <tbody><tr><td>1</td><td>a|b</td></tr></tbody></table>";
    assert_eq!(
        paste(html, true).unwrap(),
        "| A | B |\n| --- | --- |\n| 1 | a\\|b |\n"
    );
}

#[test]
fn table_without_sections() {
    let html = "<table><tr><th>H</th></tr><tr><td>x</td></tr></table>";
    assert_eq!(paste(html, true).unwrap(), "| H |\n| --- |\n| x |\n");
}

#[test]
fn table_alignment_attributes() {
    let html = r#"<table><tr><th align="left">L</th><th align="center">C</th><th align="right">R</th></tr></table>"#;
    assert_eq!(
        paste(html, true).unwrap(),
        "| L | C | R |\n| :-- | :-: | --: |\n"
    );
}

#[test]
fn strikethrough_requires_extended_syntax() {
    assert_eq!(paste("<p><del>old</del></p>", true).unwrap(), "~~old~~\n");
    assert_eq!(paste("<p><del>old</del></p>", false).unwrap(), "old\n");
}

#[test]
fn task_list_items() {
    let html = r#"<ul><li><input type="checkbox" checked>done</li><li><input type="checkbox">open</li></ul>"#;
    assert_eq!(paste(html, true).unwrap(), "- [x] done\n- [ ] open\n");
}

#[test]
fn highlighted_code_block_carries_language() {
    let html = r#"<div class="highlight-source-rust"><pre>fn main() {}</pre></div>"#;
    assert_eq!(paste(html, true).unwrap(), "```rust\nfn main() {}\n```\n");
}

#[test]
fn fence_escalates_past_embedded_backticks() {
    let html = "<pre><code>a\n```\nb</code></pre>";
    assert_eq!(paste(html, false).unwrap(), "````\na\n```\nb\n````\n");
}

#[test]
fn code_content_is_not_escaped() {
    assert_eq!(paste("<code>*glob* [x]</code>", false).unwrap(), "`*glob* [x]`\n");
}

#[test]
fn literal_markdown_is_escaped() {
    assert_eq!(paste("# not a heading", false).unwrap(), "\\# not a heading\n");
    assert_eq!(
        paste("<p>- not a list</p>", false).unwrap(),
        "\\- not a list\n"
    );
    assert_eq!(paste("<p>1. item</p>", false).unwrap(), "1\\. item\n");
    assert_eq!(paste("<p>a * b</p>", false).unwrap(), "a \\* b\n");
    // hash mid-line needs no escape
    assert_eq!(paste("<p>see #anchor</p>", false).unwrap(), "see #anchor\n");
}

#[test]
fn blockquote_wraps_nested_blocks() {
    assert_eq!(
        paste("<blockquote><p>a</p><p>b</p></blockquote>", false).unwrap(),
        "> a\n>\n> b\n"
    );
}

#[test]
fn hard_break_survives_trailing_trim() {
    assert_eq!(paste("<p>one<br>two</p>", false).unwrap(), "one  \ntwo\n");
}

#[test]
fn reference_links_deduplicate_definitions() {
    let options = Options {
        link_style: LinkStyle::Referenced,
        ..Options::default()
    };
    let converter = Converter::with_options(options);
    let html = r#"<p><a href="https://x.test">one</a> and <a href="https://x.test">two</a> and <a href="https://y.test">other</a></p>"#;
    assert_eq!(
        converter.convert(html).unwrap(),
        "[one][1] and [two][1] and [other][2]\n\n[1]: https://x.test\n[2]: https://y.test\n"
    );
}

#[test]
fn consecutive_blocks_separated_by_one_blank_line() {
    let html = "<h1>T</h1><p>a</p><div><p>b</p></div><p>c</p>";
    assert_eq!(paste(html, false).unwrap(), "# T\n\na\n\nb\n\nc\n");
}

#[test]
fn mixed_document() {
    let html = r#"
        <h1>Notes</h1>
        <p>Read <a href="https://x.test" title="Site">this</a> first.</p>
        <ul>
          <li>alpha</li>
          <li>beta</li>
        </ul>
        <pre><code class="language-sh">ls -la</code></pre>
    "#;
    assert_eq!(
        paste(html, true).unwrap(),
        "# Notes\n\nRead [this](https://x.test \"Site\") first.\n\n\
         - alpha\n- beta\n\n```sh\nls -la\n```\n"
    );
}
