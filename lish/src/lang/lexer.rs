//! Tokenizer for the prefix-call language.
//!
//! The token rules, in priority order:
//!
//! - A line break closes the current expression (one separator token per run
//!   of blank lines); other whitespace is skipped.
//! - `#…#` or `#`-to-end-of-line is a comment.
//! - `,` is an expression separator; `(`/`[` open a call, `)`/`]` close one
//!   (the two bracket styles are interchangeable); `'`, `$`, `@` are sigils.
//! - `"…"` produces a symbol token holding the raw bytes between the quotes;
//!   there is no escape processing.
//! - A digit run is an integer literal.  A digit run followed by `.` is a
//!   float literal, which the language does not support — it is rejected
//!   with a located diagnostic rather than truncated.
//! - Anything else is a maximal symbol run, with `do` and `end` mapped to
//!   their own kinds on exact match.
//!
//! Symbol and string text is copied into the arena so tokens stay valid after
//! the source buffer is gone.

use std::fmt;

use crate::arena::Arena;
use super::diag::{Diagnostic, Span};

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind<'a> {
    /// A bare symbol or a quoted string (the two are indistinguishable after
    /// lexing; both carry arena-owned text).
    Sym(&'a str),
    Int(i64),
    /// `,` or a line break.
    EndExpr,
    Open,
    Close,
    Do,
    End,
    /// `'`, `$`, or `@` — marks the following symbol as a variable reference.
    Sigil,
    /// End-of-stream sentinel; always the final token.
    Eos,
}

#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Sym(s) => write!(f, "{s} (Symbol)"),
            TokenKind::Int(v) => write!(f, "{v} (Integer)"),
            TokenKind::EndExpr => write!(f, "Expr-end (',' | \\n)"),
            TokenKind::Open => write!(f, "("),
            TokenKind::Close => write!(f, ")"),
            TokenKind::Do => write!(f, "do"),
            TokenKind::End => write!(f, "end"),
            TokenKind::Sigil => write!(f, "Sigil (' | $ | @)"),
            TokenKind::Eos => write!(f, "EOF"),
        }
    }
}

// ── Character classes ─────────────────────────────────────────────────────────

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Single characters that form a token on their own.
fn special_token(b: u8) -> Option<TokenKind<'static>> {
    match b {
        b',' => Some(TokenKind::EndExpr),
        b'(' | b'[' => Some(TokenKind::Open),
        b')' | b']' => Some(TokenKind::Close),
        b'\'' | b'$' | b'@' => Some(TokenKind::Sigil),
        _ => None,
    }
}

/// Any byte that is not whitespace, a special-character token, or NUL can
/// appear inside a symbol (this includes `#` and `"` when not at the start
/// of a token, and all non-ASCII bytes).
fn is_symbol_byte(b: u8) -> bool {
    b != 0 && !is_whitespace(b) && special_token(b).is_none()
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

/// Tokenize `src`, copying symbol text into `arena`.
///
/// The only fatal lexing error is a float literal; everything else always
/// produces a token stream terminated by [`TokenKind::Eos`].
pub fn tokenize<'a>(src: &str, arena: &'a Arena) -> Result<Vec<Token<'a>>, Diagnostic> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == 0 {
            break;
        }

        if b == b'\n' {
            tokens.push(Token {
                kind: TokenKind::EndExpr,
                span: Span::new(i, 1),
            });
            while i < bytes.len() && is_whitespace(bytes[i]) {
                i += 1;
            }
            continue;
        }

        if is_whitespace(b) {
            i += 1;
            continue;
        }

        if b == b'#' {
            i += 1;
            while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'#' {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'#' {
                i += 1;
            }
            continue;
        }

        if let Some(kind) = special_token(b) {
            tokens.push(Token {
                kind,
                span: Span::new(i, 1),
            });
            i += 1;
            continue;
        }

        if b == b'"' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            let text = &src[start..i];
            let len = i - start;
            if i < bytes.len() {
                i += 1; // closing quote
            }
            tokens.push(Token {
                kind: TokenKind::Sym(arena.alloc_str(text)),
                span: Span::new(start, len),
            });
            continue;
        }

        if b.is_ascii_digit() {
            let start = i;
            let mut value: i64 = 0;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                value = value
                    .wrapping_mul(10)
                    .wrapping_add((bytes[i] - b'0') as i64);
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'.' {
                return Err(Diagnostic::error(
                    "Float literals are not supported",
                    Span::new(start, i + 1 - start),
                ));
            }
            tokens.push(Token {
                kind: TokenKind::Int(value),
                span: Span::new(start, i - start),
            });
            continue;
        }

        // Anything left is a symbol or keyword.
        let start = i;
        while i < bytes.len() && is_symbol_byte(bytes[i]) {
            i += 1;
        }
        let text = &src[start..i];
        let kind = match text {
            "do" => TokenKind::Do,
            "end" => TokenKind::End,
            _ => TokenKind::Sym(arena.alloc_str(text)),
        };
        tokens.push(Token {
            kind,
            span: Span::new(start, i - start),
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eos,
        span: Span::new(i, 0),
    });
    Ok(tokens)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
