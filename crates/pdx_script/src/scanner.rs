//! Line scanning primitives for Paradox script text.
//!
//! Paradox script is a loose `key = value` / `key = { ... }` language. The
//! helpers here never fail: they normalize whitespace, pull keys and values
//! out of single lines and track brace depth across a file. Brace anomalies
//! are recorded so that callers can decide whether a file is usable.

use camino::Utf8Path;

pub const SCRIPT_COMMENT: &str = "#";
pub const LUA_COMMENT: &str = "--";
pub const OPEN_OBJECT: char = '{';
pub const CLOSE_OBJECT: char = '}';
pub const EQUALS: char = '=';
pub const QUOTE: char = '"';
/// Start of an object once whitespace has been cleaned: `key={`.
pub const BLOCK_SEPARATOR: &str = "={";
pub const VARIABLE_SEPARATOR: &str = "=";

/// Which comment marker applies to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    #[default]
    Hash,
    Lua,
}

impl CommentStyle {
    pub fn for_file(path: &Utf8Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("lua") => CommentStyle::Lua,
            _ => CommentStyle::Hash,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            CommentStyle::Hash => SCRIPT_COMMENT,
            CommentStyle::Lua => LUA_COMMENT,
        }
    }
}

/// Removes a trailing comment, ignoring markers inside quoted strings.
pub fn strip_comment(line: &str, style: CommentStyle) -> &str {
    let marker = style.marker();
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        if ch == QUOTE {
            in_quotes = !in_quotes;
            continue;
        }
        if !in_quotes && line[idx..].starts_with(marker) {
            return &line[..idx];
        }
    }
    line
}

/// Trims the line, collapses whitespace runs into a single space and drops
/// the spaces around `=`, `{` and `}`.
///
/// `"a  =\t{ b = c }"` becomes `"a={b=c}"`.
pub fn clean_whitespace(line: &str) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(" =", "=")
        .replace("= ", "=")
        .replace(" {", "{")
        .replace("{ ", "{")
        .replace(" }", "}")
        .replace("} ", "}")
}

/// Expands a cleaned line back into a spaced `a = { b = c }` layout.
pub fn prettify_line(line: &str) -> String {
    clean_whitespace(line)
        .replace('=', " = ")
        .replace('{', " { ")
        .replace('}', " } ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cuts text at the first whitespace or brace.
pub fn clean_parsed_text(text: &str) -> &str {
    let end = text
        .find(|c: char| c.is_whitespace() || c == OPEN_OBJECT || c == CLOSE_OBJECT)
        .unwrap_or(text.len());
    &text[..end]
}

/// Returns every double-quoted string on the line, in order.
pub fn quoted_values(text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(QUOTE) {
        let after = &rest[start + 1..];
        let Some(len) = after.find(QUOTE) else {
            break;
        };
        values.push(after[..len].to_string());
        rest = &after[len + 1..];
    }
    values
}

fn first_quoted(text: &str) -> Option<&str> {
    let start = text.find(QUOTE)? + 1;
    let len = text[start..].find(QUOTE)?;
    Some(&text[start..start + len])
}

// ASCII lowercasing keeps byte offsets stable, so indices map back onto the input.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn extract_token(part: &str) -> String {
    let part = part.trim();
    if part.starts_with(QUOTE) {
        return first_quoted(part).unwrap_or_default().to_string();
    }
    clean_parsed_text(&part.replace(QUOTE, "")).to_string()
}

/// Returns the key in front of `separator`, or an empty string when the line
/// has no such key.
pub fn get_key(line: &str, separator: &str) -> String {
    let cleaned = clean_whitespace(line);
    let Some(idx) = find_ignore_case(&cleaned, separator) else {
        return String::new();
    };
    if idx > 0 && cleaned[..idx].ends_with(char::is_whitespace) {
        return String::new();
    }
    cleaned
        .split(separator)
        .find(|part| !part.is_empty())
        .map(extract_token)
        .unwrap_or_default()
}

/// Returns the value that follows `separator` (for example `"id="`).
///
/// The separator only matches at a token boundary, so `"id="` does not match
/// inside `"planet_id=..."`. Quoted values are returned without quotes.
pub fn get_value(line: &str, separator: &str) -> String {
    let cleaned = clean_whitespace(line);
    let Some(idx) = find_ignore_case(&cleaned, separator) else {
        return String::new();
    };
    if let Some(prev) = cleaned[..idx].chars().last() {
        if !(prev.is_whitespace() || prev == OPEN_OBJECT || prev == CLOSE_OBJECT) {
            return String::new();
        }
    }
    let rest = &cleaned[idx + separator.len()..];
    rest.split(separator)
        .find(|part| !part.is_empty())
        .map(extract_token)
        .unwrap_or_default()
}

/// Kind of brace problem found while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// A `}` with no matching `{`; the brace is ignored.
    UnexpectedClose,
    /// A `{` still open at end of input; it is closed implicitly.
    Unclosed,
}

/// Brace anomaly at a 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceAnomaly {
    pub line: usize,
    pub column: usize,
    pub kind: AnomalyKind,
}

/// One scanned line with its brace bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine<'a> {
    /// 1-based line number.
    pub number: usize,
    pub raw: &'a str,
    /// Line without its comment, trailing whitespace trimmed.
    pub code: &'a str,
    pub cleaned: String,
    pub opens: usize,
    /// Matched closing braces only.
    pub closes: usize,
    pub depth_before: usize,
    pub depth_after: usize,
}

impl ScannedLine<'_> {
    pub fn is_blank(&self) -> bool {
        self.cleaned.is_empty()
    }

    /// `key={...` or a dangling `key=` whose brace follows on a later line.
    pub fn is_block_start(&self) -> bool {
        self.cleaned.contains(BLOCK_SEPARATOR) || self.cleaned.ends_with(EQUALS)
    }

    pub fn is_assignment(&self) -> bool {
        self.cleaned.contains(EQUALS)
    }

    /// The line opens and closes its outermost block itself.
    pub fn is_inline_block(&self) -> bool {
        self.opens > 0 && self.depth_after == self.depth_before
    }
}

/// Streams lines while folding brace depth across the whole input.
///
/// Braces inside quoted strings are not counted. Use `by_ref()` to iterate
/// and [`LineScanner::finish`] to collect anomalies afterwards.
pub struct LineScanner<'a> {
    lines: &'a [String],
    style: CommentStyle,
    index: usize,
    open_stack: Vec<(usize, usize)>,
    anomalies: Vec<BraceAnomaly>,
}

impl<'a> LineScanner<'a> {
    pub fn new(lines: &'a [String], style: CommentStyle) -> Self {
        Self {
            lines,
            style,
            index: 0,
            open_stack: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.open_stack.len()
    }

    /// No brace is open and none closed without an opener so far.
    pub fn is_balanced(&self) -> bool {
        self.open_stack.is_empty() && self.anomalies.is_empty()
    }

    /// Closes any still-open braces implicitly and returns every anomaly seen.
    pub fn finish(mut self) -> Vec<BraceAnomaly> {
        for (line, column) in self.open_stack.drain(..) {
            self.anomalies.push(BraceAnomaly {
                line,
                column,
                kind: AnomalyKind::Unclosed,
            });
        }
        self.anomalies.sort_by_key(|a| (a.line, a.column));
        self.anomalies
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = ScannedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.lines.get(self.index)?.as_str();
        self.index += 1;
        let number = self.index;

        let code = strip_comment(raw, self.style).trim_end();
        let depth_before = self.open_stack.len();
        let mut opens = 0;
        let mut closes = 0;
        let mut in_quotes = false;
        for (column, ch) in code.chars().enumerate() {
            match ch {
                QUOTE => in_quotes = !in_quotes,
                OPEN_OBJECT if !in_quotes => {
                    opens += 1;
                    self.open_stack.push((number, column + 1));
                }
                CLOSE_OBJECT if !in_quotes => {
                    if self.open_stack.pop().is_some() {
                        closes += 1;
                    } else {
                        self.anomalies.push(BraceAnomaly {
                            line: number,
                            column: column + 1,
                            kind: AnomalyKind::UnexpectedClose,
                        });
                    }
                }
                _ => {}
            }
        }

        Some(ScannedLine {
            number,
            raw,
            code,
            cleaned: clean_whitespace(code),
            opens,
            closes,
            depth_before,
            depth_after: self.open_stack.len(),
        })
    }
}

/// Splits decoded text into lines, dropping a UTF-8 byte order mark.
pub fn split_lines(text: &str) -> Vec<String> {
    text.trim_start_matches('\u{feff}')
        .lines()
        .map(|line| line.to_string())
        .collect()
}

/// Lines reduced to their comparable form: comments removed, whitespace
/// cleaned, blank lines dropped.
pub fn normalized_lines(lines: &[String], style: CommentStyle) -> Vec<String> {
    lines
        .iter()
        .map(|line| clean_whitespace(strip_comment(line, style)))
        .filter(|line| !line.is_empty())
        .collect()
}
