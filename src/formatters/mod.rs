// ABOUTME: Response formatting pipeline turning raw model text into markup
// ABOUTME: Ordered pure stages over typed segments for math, code, and tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Response Formatter
//!
//! Model output arrives as a mix of Markdown, LaTeX-style math delimiters,
//! fenced code blocks, and pipe tables. [`format_response`] rewrites it
//! into display markup through a fixed stage order. Each stage only ever
//! touches prose segments, so content extracted by an earlier stage (math,
//! code) is opaque to every later one.
//!
//! The function is total. Malformed input degrades to plain paragraph
//! rendering instead of erroring, and empty input yields an empty string.

use regex::Regex;
use std::sync::LazyLock;

pub mod speech;

pub use speech::clean_for_speech;

/// One typed region of the answer during formatting
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Prose still subject to later stages
    Text(String),
    /// Display math, rendered centered on its own line
    MathBlock(String),
    /// Inline math
    MathInline(String),
    /// Fenced code, rendered verbatim with a language header
    Code { label: String, body: String },
    /// Pipe table rows, separator lines already dropped
    Table(Vec<Vec<String>>),
}

/// Patterns stored as Option so a compilation failure degrades to a
/// skipped stage instead of a panic (static patterns never fail in practice)
static HEADING_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s*").ok());

static RULE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^[-*_]{3,}$").ok());

static BLANK_RUN_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n{2,}").ok());

static MATH_DOLLAR_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").ok());

static MATH_DOLLAR_INLINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$([^$]+)\$").ok());

static MATH_PAREN_INLINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\\\((.*?)\\\)").ok());

static MATH_BRACKET_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").ok());

static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w*)\n?(.*?)```").ok());

static BOLD_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").ok());

static ITALIC_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").ok());

static INLINE_CODE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"`([^`]+)`").ok());

/// Format one raw model answer into display markup
#[must_use]
pub fn format_response(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut segments = vec![Segment::Text(sanitize(raw))];
    segments = extract_math(segments);
    segments = extract_code(segments);
    segments = rewrite_emphasis(segments);
    segments = extract_tables(segments);

    let body = render(&segments);
    format!("<div class=\"ai-reply fade-in\">{body}</div>")
}

/// Stage 1: drop heading markers and horizontal rules, collapse blank runs
fn sanitize(raw: &str) -> String {
    let mut text = raw.to_owned();
    if let Some(pattern) = HEADING_PATTERN.as_ref() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    if let Some(pattern) = RULE_PATTERN.as_ref() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    if let Some(pattern) = BLANK_RUN_PATTERN.as_ref() {
        text = pattern.replace_all(&text, "\n").into_owned();
    }
    text
}

/// Apply `split` to every prose segment, leaving extracted segments alone
fn map_text_segments<F>(segments: Vec<Segment>, split: F) -> Vec<Segment>
where
    F: Fn(&str) -> Vec<Segment>,
{
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Text(text) => out.extend(split(&text)),
            other => out.push(other),
        }
    }
    out
}

/// Split prose on `pattern`, turning each capture into `make(capture)`
fn split_on_pattern<F>(text: &str, pattern: Option<&Regex>, make: F) -> Vec<Segment>
where
    F: Fn(&str) -> Segment,
{
    let Some(pattern) = pattern else {
        return vec![Segment::Text(text.to_owned())];
    };

    let mut out = Vec::new();
    let mut cursor = 0;
    for captures in pattern.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            out.push(Segment::Text(text[cursor..whole.start()].to_owned()));
        }
        let content = captures.get(1).map_or("", |m| m.as_str());
        out.push(make(content));
        cursor = whole.end();
    }
    if cursor < text.len() {
        out.push(Segment::Text(text[cursor..].to_owned()));
    }
    out
}

/// Stage 2: pull math out of prose before anything can mistake it for code
fn extract_math(segments: Vec<Segment>) -> Vec<Segment> {
    let segments = map_text_segments(segments, |text| {
        split_on_pattern(text, MATH_DOLLAR_BLOCK.as_ref(), |c| {
            Segment::MathBlock(c.to_owned())
        })
    });
    let segments = map_text_segments(segments, |text| {
        split_on_pattern(text, MATH_DOLLAR_INLINE.as_ref(), |c| {
            Segment::MathInline(c.to_owned())
        })
    });
    let segments = map_text_segments(segments, |text| {
        split_on_pattern(text, MATH_PAREN_INLINE.as_ref(), |c| {
            Segment::MathInline(c.to_owned())
        })
    });
    map_text_segments(segments, |text| {
        split_on_pattern(text, MATH_BRACKET_BLOCK.as_ref(), |c| {
            Segment::MathBlock(c.to_owned())
        })
    })
}

/// Stage 3: extract fenced code verbatim, immune to every later stage
fn extract_code(segments: Vec<Segment>) -> Vec<Segment> {
    map_text_segments(segments, |text| {
        let Some(pattern) = CODE_FENCE.as_ref() else {
            return vec![Segment::Text(text.to_owned())];
        };

        let mut out = Vec::new();
        let mut cursor = 0;
        for captures in pattern.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if whole.start() > cursor {
                out.push(Segment::Text(text[cursor..whole.start()].to_owned()));
            }
            let lang = captures.get(1).map_or("", |m| m.as_str());
            let label = if lang.is_empty() {
                "Code".to_owned()
            } else {
                lang.to_owned()
            };
            let body = captures.get(2).map_or("", |m| m.as_str()).to_owned();
            out.push(Segment::Code { label, body });
            cursor = whole.end();
        }
        if cursor < text.len() {
            out.push(Segment::Text(text[cursor..].to_owned()));
        }
        out
    })
}

/// Stage 4: bold, italic, and inline-code spans inside prose only
fn rewrite_emphasis(segments: Vec<Segment>) -> Vec<Segment> {
    map_text_segments(segments, |text| {
        let mut text = text.to_owned();
        if let Some(pattern) = BOLD_PATTERN.as_ref() {
            text = pattern.replace_all(&text, "<strong>$1</strong>").into_owned();
        }
        if let Some(pattern) = ITALIC_PATTERN.as_ref() {
            text = pattern.replace_all(&text, "<em>$1</em>").into_owned();
        }
        if let Some(pattern) = INLINE_CODE_PATTERN.as_ref() {
            text = pattern
                .replace_all(&text, "<code class='inline-code'>$1</code>")
                .into_owned();
        }
        vec![Segment::Text(text)]
    })
}

/// A structural header-divider row of pipes, colons, dashes, and spaces
fn is_separator_row(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| c == '|' || c == ':' || c == '-' || c.is_whitespace())
}

fn parse_table_run(lines: &[&str]) -> Segment {
    let rows = lines
        .iter()
        .filter(|line| !is_separator_row(line))
        .map(|line| {
            line.split('|')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .collect();
    Segment::Table(rows)
}

/// Stage 5: contiguous runs of pipe-bearing lines become tables
///
/// The newline that separated the last table row from the following
/// prose belongs to the table run, so it never resurfaces as a line
/// break in stage 6.
fn extract_tables(segments: Vec<Segment>) -> Vec<Segment> {
    map_text_segments(segments, |text| {
        let mut out = Vec::new();
        let mut prose: Vec<&str> = Vec::new();
        let mut run: Vec<&str> = Vec::new();

        let flush_prose = |prose: &mut Vec<&str>, out: &mut Vec<Segment>, before_table: bool| {
            if prose.iter().all(|line| line.is_empty()) && prose.len() <= 1 {
                prose.clear();
                return;
            }
            let mut joined = prose.join("\n");
            if before_table {
                joined.push('\n');
            }
            out.push(Segment::Text(joined));
            prose.clear();
        };

        for line in text.split('\n') {
            if line.contains('|') {
                run.push(line);
            } else {
                if !run.is_empty() {
                    flush_prose(&mut prose, &mut out, true);
                    // run flushed before the prose line is recorded
                    let table = parse_table_run(&run);
                    run.clear();
                    out.push(table);
                }
                prose.push(line);
            }
        }

        if run.is_empty() {
            flush_prose(&mut prose, &mut out, false);
        } else {
            flush_prose(&mut prose, &mut out, true);
            out.push(parse_table_run(&run));
        }
        out
    })
}

fn escape_code(body: &str) -> String {
    html_escape::encode_text(body).into_owned()
}

/// Stage 6: serialize segments, remaining prose newlines become breaks
fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(&text.replace('\n', "<br>")),
            Segment::MathBlock(content) => {
                out.push_str(&format!(
                    "<div class=\"math-block\">\\({content}\\)</div>"
                ));
            }
            Segment::MathInline(content) => {
                out.push_str(&format!(
                    "<span class=\"math-inline\">\\({content}\\)</span>"
                ));
            }
            Segment::Code { label, body } => {
                out.push_str(&format!(
                    "<pre class=\"code-block\"><div class=\"code-header\">{label}</div><code>{}</code></pre>",
                    escape_code(body)
                ));
            }
            Segment::Table(rows) => {
                out.push_str("<div class=\"table-wrapper\"><table class=\"markdown-table\">");
                for row in rows {
                    out.push_str("<tr>");
                    for cell in row {
                        out.push_str(&format!("<td>{cell}</td>"));
                    }
                    out.push_str("</tr>");
                }
                out.push_str("</table></div>");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(format_response(""), "");
    }

    #[test]
    fn test_plain_text_only_gains_breaks() {
        let out = format_response("hello\nworld");
        assert_eq!(out, "<div class=\"ai-reply fade-in\">hello<br>world</div>");
    }

    #[test]
    fn test_heading_markers_stripped_text_kept() {
        let out = format_response("## Summary\nbody");
        assert!(out.contains("Summary<br>body"));
        assert!(!out.contains('#'));
    }

    #[test]
    fn test_horizontal_rules_deleted() {
        let out = format_response("above\n---\nbelow");
        assert!(!out.contains("---"));
        assert!(out.contains("above"));
        assert!(out.contains("below"));
    }

    #[test]
    fn test_code_block_content_is_opaque() {
        let out = format_response("```js\nlet a = 1<2 && \"*x*\";\n```");
        assert!(out.contains("<div class=\"code-header\">js</div>"));
        assert!(out.contains("1&lt;2 &amp;&amp;"));
        assert!(out.contains("\"*x*\""));
        assert!(!out.contains("<em>x</em>"));
    }

    #[test]
    fn test_code_block_without_language_gets_default_label() {
        let out = format_response("```\nplain\n```");
        assert!(out.contains("<div class=\"code-header\">Code</div>"));
    }

    #[test]
    fn test_inline_emphasis() {
        let out = format_response("**bold** and *slanted* and `x()`");
        assert!(out.contains("<strong>bold</strong>"));
        assert!(out.contains("<em>slanted</em>"));
        assert!(out.contains("<code class='inline-code'>x()</code>"));
    }

    #[test]
    fn test_block_math() {
        let out = format_response("$$E = mc^2$$");
        assert!(out.contains("<div class=\"math-block\">\\(E = mc^2\\)</div>"));
    }

    #[test]
    fn test_inline_math_not_mistaken_for_code() {
        let out = format_response("value $x_1$ here");
        assert!(out.contains("<span class=\"math-inline\">\\(x_1\\)</span>"));
        assert!(!out.contains("inline-code"));
    }

    #[test]
    fn test_bracket_math_delimiters() {
        let out = format_response(r"before \(a+b\) after \[c+d\]");
        assert!(out.contains("<span class=\"math-inline\">\\(a+b\\)</span>"));
        assert!(out.contains("<div class=\"math-block\">\\(c+d\\)</div>"));
    }

    #[test]
    fn test_table_drops_separator_and_keeps_shape() {
        let out = format_response("a|b\n-|-\nc|d\n");
        let expected = "<div class=\"table-wrapper\"><table class=\"markdown-table\">\
                        <tr><td>a</td><td>b</td></tr>\
                        <tr><td>c</td><td>d</td></tr>\
                        </table></div>";
        assert!(out.contains(expected), "got: {out}");
        assert_eq!(out.matches("<tr>").count(), 2);
        assert_eq!(out.matches("<td>").count(), 4);
    }

    #[test]
    fn test_table_with_edge_pipes_drops_empty_cells() {
        let out = format_response("| a | b |\n| c | d |");
        assert_eq!(out.matches("<td>").count(), 4);
        assert!(out.contains("<td>a</td><td>b</td>"));
    }

    #[test]
    fn test_no_break_after_table_row() {
        let out = format_response("intro\na|b\nc|d\ntail");
        assert!(out.contains("intro<br>"));
        assert!(out.contains("</table></div>tail"));
        assert!(!out.contains("</div><br>tail"));
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        let out = format_response("one\n\n\ntwo");
        assert!(out.contains("one<br>two"));
    }

    #[test]
    fn test_emphasis_untouched_inside_math() {
        let out = format_response("$a*b*c$");
        assert!(out.contains("\\(a*b*c\\)"));
        assert!(!out.contains("<em>"));
    }
}
