//! Located diagnostics.
//!
//! Parse and runtime messages point at the offending span of source text:
//! source name, 1-based line, 0-based column (tabs and spaces counted
//! separately), the source line itself, and a caret underline of the span.

use std::fmt::Write as _;

// ── Span ──────────────────────────────────────────────────────────────────────

/// A byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Span { start, len }
    }
}

// ── Source ────────────────────────────────────────────────────────────────────

/// The unit of input being parsed or evaluated: a display name (file path or
/// `"stdin"`) plus the full text, used to resolve spans in diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Source<'s> {
    pub name: &'s str,
    pub text: &'s str,
}

// ── Diagnostic ────────────────────────────────────────────────────────────────

/// A message anchored to a span.  Rendering needs the [`Source`] the span
/// refers to, so it is kept separate from construction.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub warning: bool,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
            warning: false,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            message: message.into(),
            span,
            warning: true,
        }
    }

    /// Render the message followed by the located source excerpt.
    pub fn render(&self, src: Source<'_>) -> String {
        let mut out = self.message.clone();
        out.push('\n');
        out.push_str(&line_ref(src, self.span));
        out
    }
}

/// Render the "In name:line, col" block with the offending line and a caret
/// underline.  Tabs before the span are reproduced as tabs in the underline
/// prefix so the caret lines up under any tab width.
pub fn line_ref(src: Source<'_>, span: Span) -> String {
    if span.start > src.text.len() {
        return String::from("Unable to find in source\n");
    }

    let mut line_start = 0usize;
    let mut line = 1u64;
    let mut tabs = 0usize;
    let mut spaces = 0usize;
    for (i, b) in src.text.bytes().take(span.start).enumerate() {
        match b {
            b'\n' => {
                line_start = i + 1;
                line += 1;
                tabs = 0;
                spaces = 0;
            }
            b'\t' => tabs += 1,
            _ => spaces += 1,
        }
    }

    let line_text = src.text[line_start..]
        .split('\n')
        .next()
        .unwrap_or("");

    let mut out = String::new();
    let _ = writeln!(out, "In {}:{}, {}", src.name, line, tabs + spaces);
    let _ = writeln!(out, "{line_text}");
    for _ in 0..tabs {
        out.push('\t');
    }
    for _ in 0..spaces {
        out.push(' ');
    }
    out.push('^');
    for _ in 1..span.len {
        out.push('~');
    }
    out.push('\n');
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
