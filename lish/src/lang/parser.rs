//! Recursive-descent parser producing an arena-owned prefix-call tree.
//!
//! Two call syntaxes are accepted: parenthesized `(f a b)` and juxtaposed
//! `f a b`, which build identical [`NodeKind::Call`] nodes.  `do … end`
//! groups a sequence of expressions into a block.  A sigil (`'`, `$`, `@`)
//! marks the following symbol as a variable reference instead of a string
//! constant or call name.
//!
//! One call to [`parse`] consumes a single top-level expression; leftover
//! tokens before end-of-stream produce a warning, not an error.

use std::fmt;

use crate::arena::Arena;
use super::diag::{Diagnostic, Source, Span};
use super::lexer::{self, Token, TokenKind};

// ── Parse tree ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'a> {
    /// An application: operator plus ordered arguments.
    Call {
        op: &'a ParseNode<'a>,
        args: &'a [&'a ParseNode<'a>],
    },
    /// `do … end` — a sequence evaluated in order.
    Block { exprs: &'a [&'a ParseNode<'a>] },
    /// A bare symbol: a string constant, or a call name in operator position.
    Sym(&'a str),
    Int(i64),
    /// A sigil-marked symbol: dereferenced in the environment at evaluation.
    Var(&'a str),
}

/// A node of the parse tree.  Nodes are immutable after construction and
/// live exactly as long as the arena they were built in.
#[derive(Debug, Clone, Copy)]
pub struct ParseNode<'a> {
    pub kind: NodeKind<'a>,
    pub span: Span,
}

impl<'a> ParseNode<'a> {
    /// Structural equality, ignoring source spans.
    pub fn same_shape(&self, other: &ParseNode<'_>) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Int(a), NodeKind::Int(b)) => a == b,
            (NodeKind::Sym(a), NodeKind::Sym(b)) => a == b,
            (NodeKind::Var(a), NodeKind::Var(b)) => a == b,
            (
                NodeKind::Call { op: ao, args: aa },
                NodeKind::Call { op: bo, args: ba },
            ) => {
                ao.same_shape(bo)
                    && aa.len() == ba.len()
                    && aa.iter().zip(ba.iter()).all(|(x, y)| x.same_shape(y))
            }
            (NodeKind::Block { exprs: ae }, NodeKind::Block { exprs: be }) => {
                ae.len() == be.len()
                    && ae.iter().zip(be.iter()).all(|(x, y)| x.same_shape(y))
            }
            _ => false,
        }
    }

    /// Human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            NodeKind::Sym(s) => format!("{s} (Symbol)"),
            NodeKind::Var(s) => format!("{s} (Variable)"),
            NodeKind::Int(v) => format!("{v} (Integer)"),
            NodeKind::Call { .. } => format!("{self} (Call)"),
            NodeKind::Block { .. } => format!("{self} (Block)"),
        }
    }
}

/// Whether a symbol's text can be written bare and re-lex to the same symbol.
fn symbol_is_bare(s: &str) -> bool {
    if s.is_empty() || s == "do" || s == "end" {
        return false;
    }
    let bytes = s.as_bytes();
    if bytes[0].is_ascii_digit() || bytes[0] == b'"' || bytes[0] == b'#' {
        return false;
    }
    bytes.iter().all(|&b| {
        b != 0
            && !matches!(b, b' ' | b'\t' | b'\n' | b'\r')
            && !matches!(b, b',' | b'(' | b'[' | b')' | b']' | b'\'' | b'$' | b'@')
    })
}

impl fmt::Display for ParseNode<'_> {
    /// Render back to source form.  Re-parsing the output reproduces an
    /// equivalent tree shape (spans excepted).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Int(v) => write!(f, "{v}"),
            NodeKind::Var(name) => write!(f, "${name}"),
            NodeKind::Sym(s) => {
                if symbol_is_bare(s) {
                    write!(f, "{s}")
                } else {
                    write!(f, "\"{s}\"")
                }
            }
            NodeKind::Call { op, args } => {
                write!(f, "({op}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            NodeKind::Block { exprs } => {
                write!(f, "do")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {e}")?;
                }
                write!(f, " end")
            }
        }
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// The result of one parse: at most one top-level expression, plus any
/// diagnostics.  `expr` is `None` when a diagnostic was fatal.
pub struct ParseOutcome<'a> {
    pub expr: Option<&'a ParseNode<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser<'a, 't> {
    arena: &'a Arena,
    tokens: &'t [Token<'a>],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a, '_> {
    fn peek(&self) -> Token<'a> {
        self.tokens[self.pos]
    }

    /// Take the next token.  The end-of-stream sentinel is never consumed,
    /// so the parser cannot run off the end.
    fn pop(&mut self) -> Token<'a> {
        let tok = self.tokens[self.pos];
        if !matches!(tok.kind, TokenKind::Eos) {
            self.pos += 1;
        }
        tok
    }

    fn accept(&mut self, want: TokenKind<'_>) -> bool {
        let got = self.peek().kind;
        let matches = matches!(
            (got, want),
            (TokenKind::EndExpr, TokenKind::EndExpr)
                | (TokenKind::Open, TokenKind::Open)
                | (TokenKind::Close, TokenKind::Close)
                | (TokenKind::Do, TokenKind::Do)
                | (TokenKind::End, TokenKind::End)
        );
        if matches {
            self.pos += 1;
        }
        matches
    }

    fn node(&self, kind: NodeKind<'a>, span: Span) -> &'a ParseNode<'a> {
        self.arena.alloc(ParseNode { kind, span })
    }

    fn unexpected(&mut self, tok: Token<'a>) {
        self.diagnostics.push(Diagnostic::error(
            format!("Unexpected token: {}", tok.kind),
            tok.span,
        ));
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_term(&mut self) -> Option<&'a ParseNode<'a>> {
        let tok = self.pop();
        match tok.kind {
            TokenKind::Open => {
                let op = self.parse_term()?;
                let mut args: Vec<&'a ParseNode<'a>> = Vec::new();
                while !self.accept(TokenKind::Close) {
                    args.push(self.parse_term()?);
                }
                Some(self.node(
                    NodeKind::Call {
                        op,
                        args: self.arena.alloc_slice(&args),
                    },
                    op.span,
                ))
            }

            TokenKind::Do => {
                self.accept(TokenKind::EndExpr);
                let mut exprs: Vec<&'a ParseNode<'a>> = Vec::new();
                while !self.accept(TokenKind::End) {
                    exprs.push(self.parse_expr()?);
                    self.accept(TokenKind::EndExpr);
                }
                Some(self.node(
                    NodeKind::Block {
                        exprs: self.arena.alloc_slice(&exprs),
                    },
                    tok.span,
                ))
            }

            TokenKind::Sym(text) => Some(self.node(NodeKind::Sym(text), tok.span)),

            TokenKind::Int(value) => Some(self.node(NodeKind::Int(value), tok.span)),

            TokenKind::Sigil => {
                let sym = self.pop();
                match sym.kind {
                    TokenKind::Sym(text) => Some(self.node(NodeKind::Var(text), tok.span)),
                    other => {
                        self.diagnostics.push(Diagnostic::error(
                            format!("Expected symbol following sigil, got '{other}' instead"),
                            sym.span,
                        ));
                        None
                    }
                }
            }

            _ => {
                self.unexpected(tok);
                None
            }
        }
    }

    /// A term can continue collecting juxtaposed argument terms until
    /// something that closes the expression.
    fn can_continue(&self) -> bool {
        !matches!(
            self.peek().kind,
            TokenKind::Close | TokenKind::EndExpr | TokenKind::Eos | TokenKind::End
        )
    }

    fn parse_expr(&mut self) -> Option<&'a ParseNode<'a>> {
        let op = self.parse_term()?;
        let mut args: Vec<&'a ParseNode<'a>> = Vec::new();
        while self.can_continue() {
            args.push(self.parse_term()?);
        }
        if args.is_empty() {
            return Some(op);
        }
        Some(self.node(
            NodeKind::Call {
                op,
                args: self.arena.alloc_slice(&args),
            },
            op.span,
        ))
    }
}

/// Parse one top-level expression out of `src` into `arena`.
pub fn parse<'a>(arena: &'a Arena, src: Source<'_>) -> ParseOutcome<'a> {
    let tokens = match lexer::tokenize(src.text, arena) {
        Ok(tokens) => tokens,
        Err(diag) => {
            return ParseOutcome {
                expr: None,
                diagnostics: vec![diag],
            }
        }
    };

    let mut parser = Parser {
        arena,
        tokens: &tokens,
        pos: 0,
        diagnostics: Vec::new(),
    };

    // A script may begin with a leading line break.
    parser.accept(TokenKind::EndExpr);
    let expr = parser.parse_expr();
    parser.accept(TokenKind::EndExpr);

    let trailing = parser.peek();
    if expr.is_some() && !matches!(trailing.kind, TokenKind::Eos) {
        parser.diagnostics.push(Diagnostic::warning(
            format!(
                "Warning: Extra tokens after end of expression ({})",
                trailing.kind
            ),
            trailing.span,
        ));
    }

    ParseOutcome {
        expr,
        diagnostics: parser.diagnostics,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn with_parsed<R>(text: &str, f: impl FnOnce(ParseOutcome<'_>) -> R) -> R {
        let arena = Arena::new();
        let outcome = parse(&arena, Source { name: "test", text });
        f(outcome)
    }

    fn rendered(text: &str) -> String {
        with_parsed(text, |o| o.expr.expect("no tree").to_string())
    }

    #[test]
    fn parenthesized_call() {
        assert_eq!(rendered("(+ 1 2 3)"), "(+ 1 2 3)");
    }

    #[test]
    fn juxtaposed_call_matches_parenthesized() {
        let arena = Arena::new();
        let a = parse(&arena, Source { name: "a", text: "(+ 1 2 3)" })
            .expr
            .unwrap();
        let b = parse(&arena, Source { name: "b", text: "+ 1 2 3" })
            .expr
            .unwrap();
        assert!(a.same_shape(b));
    }

    #[test]
    fn lone_term_is_not_wrapped() {
        assert_eq!(rendered("42"), "42");
        assert_eq!(rendered("foo"), "foo");
    }

    #[test]
    fn nested_calls() {
        assert_eq!(rendered("(f (g 1) 2)"), "(f (g 1) 2)");
        assert_eq!(rendered("f (g 1) 2"), "(f (g 1) 2)");
    }

    #[test]
    fn mixed_bracket_styles_close_each_other() {
        assert_eq!(rendered("[f 1)"), "(f 1)");
    }

    #[test]
    fn variable_reference() {
        assert_eq!(rendered("print $x"), "(print $x)");
    }

    #[test]
    fn block_with_separators() {
        assert_eq!(rendered("do print 1, print 2 end"), "do (print 1), (print 2) end");
    }

    #[test]
    fn empty_block() {
        assert_eq!(rendered("do end"), "do end");
    }

    #[test]
    fn block_with_leading_newline() {
        assert_eq!(rendered("do\nprint 1\nend"), "do (print 1) end");
    }

    #[test]
    fn sigil_without_symbol_is_an_error() {
        with_parsed("$1", |o| {
            assert!(o.expr.is_none());
            assert!(o.diagnostics[0].message.contains("Expected symbol following sigil"));
        });
    }

    #[test]
    fn unexpected_token_aborts() {
        with_parsed(")", |o| {
            assert!(o.expr.is_none());
            assert!(o.diagnostics[0].message.contains("Unexpected token"));
        });
    }

    #[test]
    fn separator_inside_parens_is_an_error() {
        with_parsed("(f 1,\n2)", |o| {
            assert!(o.expr.is_none());
        });
    }

    #[test]
    fn extra_tokens_warn_but_do_not_fail() {
        with_parsed("f 1\ng 2", |o| {
            assert!(o.expr.is_some());
            assert_eq!(o.diagnostics.len(), 1);
            assert!(o.diagnostics[0].warning);
            assert!(o.diagnostics[0].message.contains("Extra tokens"));
        });
    }

    #[test]
    fn leading_separator_is_allowed() {
        assert_eq!(rendered("\nf 1"), "(f 1)");
    }

    #[test]
    fn round_trip_preserves_shape() {
        let arena = Arena::new();
        for text in [
            "(+ 1 2 3)",
            "let x (lambda a b (+ $a $b))",
            "do f 1, g $x end",
            "map $files (lambda f (print $f))",
            "\"quoted text\" 5",
        ] {
            let first = parse(&arena, Source { name: "t", text }).expr.unwrap();
            let printed = first.to_string();
            let second = parse(
                &arena,
                Source { name: "t2", text: &printed },
            )
            .expr
            .unwrap();
            assert!(
                first.same_shape(second),
                "round trip changed shape: {text} -> {printed}"
            );
        }
    }

    #[test]
    fn quoted_symbol_renders_quoted() {
        assert_eq!(rendered("\"a b\""), "\"a b\"");
    }

    #[test]
    fn float_literal_reports_and_fails() {
        with_parsed("f 3.5", |o| {
            assert!(o.expr.is_none());
            assert!(o.diagnostics[0].message.contains("Float"));
        });
    }
}
