//! Markdown escaping and the final whitespace post-processor.
//!
//! Escaping happens in two stages. Characters that are hazardous anywhere
//! (`\`, `` ` ``, `*`, `_`, `[`, `]`) are backslash-escaped directly when a
//! text run is rendered. Characters that are only hazardous at the start of
//! a line (`#`, `>`, list markers, horizontal-rule and fence lookalikes) are
//! tagged with a private-use marker instead; [`post_process`] resolves the
//! markers once the final line layout of the document is known, so a literal
//! `#` is escaped only when it actually starts a line in the output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker placed before characters that are only hazardous at line start.
pub(crate) const LINE_START_MARK: char = '\u{E000}';

/// Marker emitted by the line-break rule; resolved to a two-space hard break.
pub(crate) const HARD_BREAK_MARK: char = '\u{E001}';

/// Characters escaped wherever they occur in a text run.
static MARKDOWN_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\\`*_\[\]]").unwrap());

/// Candidates for line-start escaping: ATX headings, blockquotes, bullet and
/// ordered list markers, setext underlines, `~~~` fences, `---` rules.
static LINE_START_HAZARDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#>+=~-]|\d+\.").unwrap());

static MARK_HAZARD: Lazy<String> = Lazy::new(|| format!("{LINE_START_MARK}$0"));

static EXCESS_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// A line prefix after which a hazard still sits at "line start" for
/// Markdown purposes: indentation, blockquote markers, list prefixes.
static STRUCTURAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[ \t>]|[-*+] |\d+\. )*$").unwrap());

/// Escape a plain-text run so it survives as literal Markdown text.
///
/// Line-start-sensitive characters come back tagged with a private marker
/// rather than escaped; the final decision is made by [`post_process`].
pub fn escape(text: &str) -> String {
    // Stray marker characters in the input would confuse the resolver.
    let cleaned: String;
    let text = if text.contains(LINE_START_MARK) || text.contains(HARD_BREAK_MARK) {
        cleaned = text
            .chars()
            .filter(|c| *c != LINE_START_MARK && *c != HARD_BREAK_MARK)
            .collect();
        &cleaned
    } else {
        text
    };

    let escaped = MARKDOWN_CHARS.replace_all(text, r"\$0");
    LINE_START_HAZARDS
        .replace_all(&escaped, MARK_HAZARD.as_str())
        .into_owned()
}

/// Final pass over the assembled document: resolve escape markers, trim
/// trailing whitespace per line (hard breaks excepted), collapse runs of
/// blank lines, and normalize to exactly one trailing newline.
pub(crate) fn post_process(raw: &str) -> String {
    let lines: Vec<String> = raw
        .split('\n')
        .map(|line| finish_line(resolve_line(line)))
        .collect();
    let joined = lines.join("\n");
    let collapsed = EXCESS_BLANK_LINES.replace_all(&joined, "\n\n");
    let trimmed = collapsed.trim_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Turn each escape marker on the line into a backslash or drop it,
/// depending on whether the tagged character sits at line start.
fn resolve_line(line: &str) -> String {
    if !line.contains(LINE_START_MARK) {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    // Lookahead that sees through markers on subsequent hazard characters.
    fn peek_past_marks<I>(chars: &I, n: usize) -> Option<char>
    where
        I: Iterator<Item = char> + Clone,
    {
        chars.clone().filter(|c| *c != LINE_START_MARK).nth(n)
    }

    while let Some(c) = chars.next() {
        if c != LINE_START_MARK {
            out.push(c);
            continue;
        }
        let at_line_start = STRUCTURAL_PREFIX.is_match(&out);
        match chars.peek().copied() {
            Some('#') | Some('>') | Some('=') => {
                if at_line_start {
                    out.push('\\');
                }
                out.push(chars.next().unwrap());
            }
            Some(marker @ ('-' | '+')) => {
                chars.next();
                let next = peek_past_marks(&chars, 0);
                // "- x" and "---" are hazards, "-x" is not; "+" only as "+ x".
                let hazardous = match marker {
                    '-' => matches!(next, None | Some(' ') | Some('-')),
                    _ => matches!(next, None | Some(' ')),
                };
                if at_line_start && hazardous {
                    out.push('\\');
                }
                out.push(marker);
            }
            Some('~') => {
                chars.next();
                let fence = peek_past_marks(&chars, 0) == Some('~')
                    && peek_past_marks(&chars, 1) == Some('~');
                if at_line_start && fence {
                    out.push('\\');
                }
                out.push('~');
            }
            Some(d) if d.is_ascii_digit() => {
                while let Some(d) = chars.peek().copied() {
                    if d.is_ascii_digit() {
                        out.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek().copied() == Some('.') {
                    chars.next();
                    let followed = matches!(chars.peek().copied(), None | Some(' '));
                    if at_line_start && followed {
                        out.push('\\');
                    }
                    out.push('.');
                }
            }
            _ => {} // stray marker, drop it
        }
    }

    out
}

/// Trim trailing whitespace, preserving an intentional hard break.
fn finish_line(resolved: String) -> String {
    let kept = resolved
        .trim_end_matches(|c: char| c == ' ' || c == '\t' || c == HARD_BREAK_MARK)
        .len();
    let hard_break = resolved[kept..].contains(HARD_BREAK_MARK);
    let mut line: String = resolved[..kept]
        .chars()
        .filter(|c| *c != HARD_BREAK_MARK)
        .collect();
    if hard_break && !line.is_empty() {
        line.push_str("  ");
    }
    line
}
