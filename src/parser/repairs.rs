//! Syntax repair stages for near-JSON text.
//!
//! Each stage is a pure text transform. The parser applies them cumulatively
//! in [`STAGES`] order and retries a parse after each one.

use regex::Regex;

/// A single repair transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `,` directly before `}` or `]`
    TrailingCommas,
    /// `// ...` to end of line, outside strings (approximate)
    LineComments,
    /// `/* ... */`
    BlockComments,
    /// Python-dict quoting: `{'a': 'b'}`
    SingleQuotes,
    /// Unclosed strings, objects and arrays at end of input
    CloseBrackets,
    /// `<tag>` markup
    HtmlTags,
}

/// Cumulative application order.
pub const STAGES: [Stage; 6] = [
    Stage::TrailingCommas,
    Stage::LineComments,
    Stage::BlockComments,
    Stage::SingleQuotes,
    Stage::CloseBrackets,
    Stage::HtmlTags,
];

/// Only the first this-many characters are inspected for double quotes when
/// deciding whether text is Python-dict style.
const QUOTE_SNIFF_CHARS: usize = 100;

/// Compiled patterns for the repair stages.
pub struct Repairs {
    trailing_comma: Regex,
    block_comment: Regex,
    single_quoted_key: Regex,
    single_quoted_value: Regex,
    single_quoted_item: Regex,
    python_literal: Regex,
    html_tag: Regex,
}

impl Default for Repairs {
    fn default() -> Self {
        Self::new()
    }
}

impl Repairs {
    pub fn new() -> Self {
        Self {
            trailing_comma: Regex::new(r",\s*([}\]])").unwrap(),
            block_comment: Regex::new(r"(?s)/\*.*?\*/").unwrap(),
            single_quoted_key: Regex::new(r"'([^']*)'\s*:").unwrap(),
            single_quoted_value: Regex::new(r":\s*'([^']*)'").unwrap(),
            single_quoted_item: Regex::new(r"([\[,]\s*)'([^']*)'").unwrap(),
            python_literal: Regex::new(r"([:\[,]\s*)(True|False|None)\b").unwrap(),
            html_tag: Regex::new(r"<[^>]+>").unwrap(),
        }
    }

    /// Apply one stage to `text`.
    pub fn apply(&self, stage: Stage, text: &str) -> String {
        match stage {
            Stage::TrailingCommas => self.trailing_comma.replace_all(text, "$1").into_owned(),
            Stage::LineComments => strip_line_comments(text),
            Stage::BlockComments => self.block_comment.replace_all(text, "").into_owned(),
            Stage::SingleQuotes => self.single_quotes(text),
            Stage::CloseBrackets => close_brackets(text),
            Stage::HtmlTags => self.html_tag.replace_all(text, "").into_owned(),
        }
    }

    fn single_quotes(&self, text: &str) -> String {
        let head: String = text.chars().take(QUOTE_SNIFF_CHARS).collect();
        // Already double-quoted JSON may legitimately contain apostrophes.
        if !text.contains('\'') || head.contains('"') {
            return text.to_string();
        }
        let text = self.single_quoted_key.replace_all(text, "\"$1\":");
        let text = self.single_quoted_value.replace_all(&text, ": \"$1\"");
        let text = self.single_quoted_item.replace_all(&text, "$1\"$2\"");
        let text = self.python_literal.replace_all(&text, |caps: &regex::Captures| {
            let literal = match &caps[2] {
                "True" => "true",
                "False" => "false",
                _ => "null",
            };
            format!("{}{}", &caps[1], literal)
        });
        text.into_owned()
    }
}

/// Remove `//` comments using a per-line quote-parity heuristic.
///
/// A `//` counts as a comment only when an even number of unescaped double
/// quotes precede it on the same line. Strings spanning lines are not tracked,
/// so a `//` inside such a string can be stripped by mistake.
fn strip_line_comments(text: &str) -> String {
    text.split('\n')
        .map(strip_line_comment)
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_line_comment(line: &str) -> &str {
    if !line.contains("//") {
        return line;
    }
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escape = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escape {
            escape = false;
            continue;
        }
        match b {
            b'\\' if in_string => escape = true,
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return line[..i].trim_end(),
            _ => {}
        }
    }
    line
}

/// Close whatever is still open at end of input, innermost first.
fn close_brackets(text: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for b in text.bytes() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.last() == Some(&b) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    if stack.is_empty() && !in_string {
        return text.to_string();
    }

    let mut out = text.trim_end().to_string();
    if in_string {
        out.push('"');
    } else if out.ends_with(',') {
        out.pop();
    }
    while let Some(closer) = stack.pop() {
        out.push(closer as char);
    }
    out
}
