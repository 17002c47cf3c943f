//! Helpers for announcement markup.
//!
//! Announcement content is opaque rich-text markup. The core only needs two
//! things from it: whether it is blank once whitespace-like markup is
//! trimmed, and a plain-text rendering for the terminal display.

use std::sync::OnceLock;

use regex::Regex;

/// Compiled patterns shared by every markup helper.
struct MarkupPatterns {
    /// Whitespace-equivalent markup anchored at the start of the content.
    leading_blank: Regex,
    /// Whitespace-equivalent markup anchored at the end of the content.
    trailing_blank: Regex,
    /// Tags that end a visual line.
    line_break: Regex,
    /// Any remaining tag.
    tag: Regex,
}

/// Whitespace, non-breaking spaces and line breaks.
const SPACING: &str = r"(?:\s|&nbsp;|&#160;|<br\s*/?>)";

const BLOCK_OPEN: &str = r"<(?:div|p|span)(?:\s[^>]*)?>";
const BLOCK_CLOSE: &str = r"</(?:div|p|span)>";

/// A single unit of whitespace-equivalent markup: spacing, or a block that
/// holds only spacing and empty blocks one level deep.
fn blank_unit() -> String {
    let empty_block = format!("{BLOCK_OPEN}{SPACING}*{BLOCK_CLOSE}");
    format!("(?:{SPACING}|{BLOCK_OPEN}(?:{SPACING}|{empty_block})*{BLOCK_CLOSE})")
}

fn patterns() -> &'static MarkupPatterns {
    static PATTERNS: OnceLock<MarkupPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let unit = blank_unit();
        MarkupPatterns {
            leading_blank: Regex::new(&format!("(?i)^{unit}+")).expect("Invalid regex pattern"),
            trailing_blank: Regex::new(&format!("(?i){unit}+$")).expect("Invalid regex pattern"),
            line_break: Regex::new(r"(?i)<br\s*/?>|</(?:div|p|li|h[1-6])>")
                .expect("Invalid regex pattern"),
            tag: Regex::new(r"<[^>]*>").expect("Invalid regex pattern"),
        }
    })
}

/// Trim whitespace-equivalent markup from both ends of `content`.
///
/// ```
/// use placard::markup::trim_blank;
///
/// assert_eq!(trim_blank("<br>&nbsp; <b>Hi</b> <p></p>"), "<b>Hi</b>");
/// ```
#[must_use]
pub fn trim_blank(content: &str) -> &str {
    let p = patterns();
    let start = p.leading_blank.find(content).map_or(0, |m| m.end());
    let rest = &content[start..];
    let end = p.trailing_blank.find(rest).map_or(rest.len(), |m| m.start());
    &rest[..end]
}

/// Check whether `content` is blank once whitespace-equivalent markup is trimmed.
#[must_use]
pub fn is_blank(content: &str) -> bool {
    trim_blank(content).is_empty()
}

/// Render markup as plain text lines for the terminal.
///
/// Line-ending tags become line breaks, every other tag is dropped and the
/// common entities are decoded.
#[must_use]
pub fn to_plain_lines(content: &str) -> Vec<String> {
    let p = patterns();
    let with_breaks = p.line_break.replace_all(content, "\n");
    let stripped = p.tag.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    let lines: Vec<String> = decoded
        .lines()
        .map(|line| line.trim().to_string())
        .collect();

    // Drop blank lines at both ends but keep intentional gaps in between
    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].to_vec(),
        _ => Vec::new(),
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
