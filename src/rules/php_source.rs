//! Lightweight PHP source preprocessing
//!
//! Not a PHP parser. The scanner knows just enough about PHP lexical
//! structure (open/close tags, strings, heredocs, comments) to blank out
//! comments and inline HTML without shifting line numbers.

use std::sync::OnceLock;

use regex::Regex;

/// Which parts of a PHP file [`clean_php`] blanks out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    pub comments: bool,
    pub html: bool,
}

impl CleanOptions {
    pub const COMMENTS_AND_HTML: CleanOptions = CleanOptions {
        comments: true,
        html: true,
    };
    pub const COMMENTS: CleanOptions = CleanOptions {
        comments: true,
        html: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Html,
    Code,
    LineComment,
    BlockComment,
    SingleQuoted,
    DoubleQuoted,
    Backtick,
    Heredoc(String),
}

/// Split on `\r\n`, `\r` or `\n`
pub fn split_lines(source: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = source.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&source[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&source[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    lines.push(&source[start..]);
    lines
}

/// Replace comments and/or inline HTML with spaces. Line breaks are kept, so
/// line `n` of the result corresponds to line `n` of the input.
pub fn clean_php(source: &str, options: CleanOptions) -> String {
    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Html;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let rest = &bytes[i..];

        match &state {
            State::Html => {
                if rest.starts_with(b"<?") {
                    let tag_len = open_tag_len(rest);
                    out.extend_from_slice(&rest[..tag_len]);
                    i += tag_len;
                    state = State::Code;
                    continue;
                }
                push_maybe_blank(&mut out, b, options.html);
            }
            State::Code => {
                if rest.starts_with(b"?>") {
                    out.extend_from_slice(b"?>");
                    i += 2;
                    state = State::Html;
                    continue;
                }
                if rest.starts_with(b"//") || (b == b'#' && rest.get(1) != Some(&b'[')) {
                    state = State::LineComment;
                    continue;
                }
                if rest.starts_with(b"/*") {
                    push_maybe_blank(&mut out, b'/', options.comments);
                    push_maybe_blank(&mut out, b'*', options.comments);
                    i += 2;
                    state = State::BlockComment;
                    continue;
                }
                if let Some((label, len)) = heredoc_start(rest) {
                    out.extend_from_slice(&rest[..len]);
                    i += len;
                    state = State::Heredoc(label);
                    continue;
                }
                match b {
                    b'\'' => state = State::SingleQuoted,
                    b'"' => state = State::DoubleQuoted,
                    b'`' => state = State::Backtick,
                    _ => {}
                }
                out.push(b);
            }
            State::LineComment => {
                if b == b'\n' || b == b'\r' {
                    out.push(b);
                    state = State::Code;
                } else if rest.starts_with(b"?>") {
                    // Closing tag ends a line comment
                    state = State::Code;
                    continue;
                } else {
                    push_maybe_blank(&mut out, b, options.comments);
                }
            }
            State::BlockComment => {
                if rest.starts_with(b"*/") {
                    push_maybe_blank(&mut out, b'*', options.comments);
                    push_maybe_blank(&mut out, b'/', options.comments);
                    i += 2;
                    state = State::Code;
                    continue;
                }
                push_maybe_blank(&mut out, b, options.comments);
            }
            State::SingleQuoted | State::DoubleQuoted | State::Backtick => {
                let quote = match state {
                    State::SingleQuoted => b'\'',
                    State::DoubleQuoted => b'"',
                    _ => b'`',
                };
                if b == b'\\' && i + 1 < bytes.len() {
                    out.extend_from_slice(&rest[..2]);
                    i += 2;
                    continue;
                }
                if b == quote {
                    state = State::Code;
                }
                out.push(b);
            }
            State::Heredoc(label) => {
                let at_line_start = i == 0 || matches!(bytes[i - 1], b'\n' | b'\r');
                if at_line_start && let Some(len) = heredoc_end(rest, label) {
                    out.extend_from_slice(&rest[..len]);
                    i += len;
                    state = State::Code;
                    continue;
                }
                out.push(b);
            }
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Blanking replaces every byte of a multi-byte character with its own
/// space, so the output stays valid UTF-8
fn push_maybe_blank(out: &mut Vec<u8>, b: u8, blank: bool) {
    if blank && b != b'\n' && b != b'\r' {
        out.push(b' ');
    } else {
        out.push(b);
    }
}

fn open_tag_len(rest: &[u8]) -> usize {
    if rest.len() >= 5 && rest[..5].eq_ignore_ascii_case(b"<?php") {
        5
    } else if rest.starts_with(b"<?=") {
        3
    } else {
        2
    }
}

fn heredoc_start(rest: &[u8]) -> Option<(String, usize)> {
    let after = rest.strip_prefix(b"<<<")?;
    let mut i = after.iter().take_while(|b| **b == b' ' || **b == b'\t').count();
    let quoted = matches!(after.get(i), Some(b'\'') | Some(b'"'));
    if quoted {
        i += 1;
    }
    let label_len = after[i..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    if label_len == 0 {
        return None;
    }
    let label = String::from_utf8_lossy(&after[i..i + label_len]).into_owned();
    i += label_len;
    if quoted {
        i += 1;
    }
    Some((label, 3 + i))
}

fn heredoc_end(rest: &[u8], label: &str) -> Option<usize> {
    let indent = rest
        .iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .count();
    let after = rest[indent..].strip_prefix(label.as_bytes())?;
    let continues_identifier = after
        .first()
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_');
    (!continues_identifier).then_some(indent + label.len())
}

/// Comments removed and every whitespace run collapsed to one space
pub fn strip_comments_and_whitespace(source: &str) -> String {
    clean_php(source, CleanOptions::COMMENTS)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn namespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^namespace [0-9A-Za-z_\\]+ ?; ?").expect("Failed to compile namespace regex")
    })
}

fn use_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^use (?:function |const )?[0-9A-Za-z_\\]+(?: as [0-9A-Za-z_]+)? ?; ?")
            .expect("Failed to compile use regex")
    })
}

fn declaration_head_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:(?:abstract|final|readonly) )*(?:class|interface|trait|enum) [0-9A-Za-z_]+",
            r"(?: ?: ?[0-9A-Za-z_\\]+)?",
            r"(?: extends [0-9A-Za-z_\\]+(?: ?, ?[0-9A-Za-z_\\]+)*)?",
            r"(?: implements [0-9A-Za-z_\\]+(?: ?, ?[0-9A-Za-z_\\]+)*)?",
            r" ?\{",
        ))
        .expect("Failed to compile declaration regex")
    })
}

/// Whether the file only declares classes, interfaces, traits or enums,
/// optionally preceded by a namespace and `use` imports. Such files execute
/// nothing when requested directly.
pub fn is_declaration_only(source: &str) -> bool {
    let stripped = strip_comments_and_whitespace(source);
    declaration_only(&stripped).unwrap_or(false)
}

fn declaration_only(stripped: &str) -> Option<bool> {
    // A single PHP block, no inline HTML before or between
    let mut rest = stripped.strip_prefix("<?php")?;
    if rest.contains("<?") {
        return Some(false);
    }
    rest = rest.trim_start();

    if let Some(m) = namespace_regex().find(rest) {
        rest = &rest[m.end()..];
    }
    while let Some(m) = use_regex().find(rest) {
        rest = &rest[m.end()..];
    }

    let mut declarations = 0;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() || rest == "?>" {
            break;
        }
        let head = declaration_head_regex().find(rest)?;
        let close = matching_brace(rest, head.end() - 1)?;
        rest = &rest[close + 1..];
        declarations += 1;
    }

    Some(declarations > 0)
}

/// Index of the brace closing the one at `open`, skipping quoted strings
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}
