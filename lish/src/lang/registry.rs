//! The extern-function registry: a growable table mapping stable indices to
//! native callbacks.
//!
//! Two callback shapes exist.  A *lazy* callback receives the raw argument
//! nodes and decides itself which to evaluate and when — the shape used by
//! control-flow operators (`if`, `let`, `lambda`).  An *eager* callback
//! receives already-evaluated values; the dispatcher evaluates the argument
//! nodes before the call.
//!
//! Handles are plain indices; they are never reused or revoked while the
//! runtime lives.  [`Registry::clear`] drops the whole table at once and is
//! idempotent — meant for shutdown only, since outstanding handles dangle
//! afterwards.

use super::diag::Source;
use super::env::Env;
use super::interp::Interp;
use super::parser::ParseNode;
use super::value::{ExternFnId, Value};

// ── Callback shapes ───────────────────────────────────────────────────────────

/// Lazy-node callback: (interpreter, environment, raw argument nodes, source,
/// whole call node) → result.
pub type LazyFn<'a> = fn(
    &Interp<'a>,
    &mut Env<'a>,
    &'a [&'a ParseNode<'a>],
    Source<'_>,
    &'a ParseNode<'a>,
) -> Value<'a>;

/// Eager-value callback: (interpreter, environment, evaluated arguments,
/// source) → result.
pub type EagerFn<'a> = fn(&Interp<'a>, &mut Env<'a>, &[Value<'a>], Source<'_>) -> Value<'a>;

#[derive(Clone, Copy)]
pub enum Callback<'a> {
    Lazy(LazyFn<'a>),
    Eager(EagerFn<'a>),
}

/// One registered extern function.
pub struct ExternEntry<'a> {
    pub callback: Callback<'a>,
    /// See [`match_arity`] for the encoding.
    pub arity: i32,
    pub name: &'static str,
}

// ── Arity ─────────────────────────────────────────────────────────────────────

/// Check an argument count against a declared arity.
///
/// A non-negative arity means exactly that many arguments.  A negative value
/// `v` means variadic with minimum `-(v + 1)`: −1 accepts any count, −2 at
/// least one, −3 at least two, and so on.
pub fn match_arity(n_args: usize, arity: i32) -> bool {
    if arity < 0 {
        let min = -(arity + 1) as usize;
        n_args >= min
    } else {
        n_args == arity as usize
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Append-only table of extern functions, owned by the runtime instance.
#[derive(Default)]
pub struct Registry<'a> {
    entries: Vec<ExternEntry<'a>>,
}

impl<'a> Registry<'a> {
    pub fn new() -> Self {
        Registry { entries: Vec::new() }
    }

    /// Append an entry and return its stable handle.
    pub fn register(&mut self, entry: ExternEntry<'a>) -> ExternFnId {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn get(&self, id: ExternFnId) -> Option<&ExternEntry<'a>> {
        self.entries.get(id)
    }

    /// Drop every entry.  Outstanding handles become dangling, so this is
    /// safe only at shutdown.  Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
