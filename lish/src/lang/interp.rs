//! The tree-walking evaluator and unified call dispatch.
//!
//! [`Interp`] owns the extern-function registry and carries no other state;
//! the environment and the current source are passed explicitly through
//! every evaluation, so nested and re-entrant evaluations need no
//! save/restore discipline.
//!
//! Evaluation never unwinds: failures collapse to [`Value::Null`], with a
//! message on the environment's error stream when silence would be
//! misleading (argument-buffer overflow, spawn failures).

use std::io::Write;
use std::rc::Rc;

use super::diag::Source;
use super::env::Env;
use super::exec;
use super::parser::{NodeKind, ParseNode};
use super::registry::{match_arity, Callback, EagerFn, ExternEntry, LazyFn, Registry};
use super::value::Value;

/// Capacity of the evaluated-argument buffer for eager dispatch.  Exceeding
/// it is reported to the error stream and yields Null.
pub const ARG_BUFFER_SIZE: usize = 32;

// ── Interp ────────────────────────────────────────────────────────────────────

/// The runtime instance: evaluator plus extern-function registry.
#[derive(Default)]
pub struct Interp<'a> {
    registry: Registry<'a>,
}

impl<'a> Interp<'a> {
    pub fn new() -> Self {
        Interp {
            registry: Registry::new(),
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Register a lazy-node extern function and return its handle value.
    pub fn register_lazy(&mut self, name: &'static str, arity: i32, f: LazyFn<'a>) -> Value<'a> {
        Value::ExternFn(self.registry.register(ExternEntry {
            callback: Callback::Lazy(f),
            arity,
            name,
        }))
    }

    /// Register an eager-value extern function and return its handle value.
    pub fn register_eager(&mut self, name: &'static str, arity: i32, f: EagerFn<'a>) -> Value<'a> {
        Value::ExternFn(self.registry.register(ExternEntry {
            callback: Callback::Eager(f),
            arity,
            name,
        }))
    }

    /// Drop the whole registry.  For shutdown; idempotent.
    pub fn clear_extern_fns(&mut self) {
        self.registry.clear();
    }

    pub fn registry(&self) -> &Registry<'a> {
        &self.registry
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    /// Evaluate one node against `env`.
    pub fn eval(&self, node: &'a ParseNode<'a>, env: &mut Env<'a>, src: Source<'_>) -> Value<'a> {
        match node.kind {
            NodeKind::Int(v) => Value::Int(v),

            // A bare symbol is a string constant; a fresh copy is allocated
            // on every evaluation.
            NodeKind::Sym(text) => Value::Str(Rc::from(text)),

            NodeKind::Var(name) => env.get(name).cloned().unwrap_or(Value::Null),

            NodeKind::Block { exprs } => {
                let mut result = Value::Null;
                for expr in exprs {
                    result = self.eval(expr, env, src);
                }
                result
            }

            NodeKind::Call { op, args } => {
                if let NodeKind::Sym(name) = op.kind {
                    match env.get(name).cloned() {
                        // An unbound call head is an external command.
                        None => {
                            let values: Vec<Value<'a>> =
                                args.iter().map(|a| self.eval(a, env, src)).collect();
                            exec::run_command(name, &values, env);
                            Value::Null
                        }
                        Some(f) => self.call_node_fn(f, args, env, src, node),
                    }
                } else {
                    let f = self.eval(op, env, src);
                    self.call_node_fn(f, args, env, src, node)
                }
            }
        }
    }

    // ── Call dispatch ─────────────────────────────────────────────────────────

    /// Call `f` with unevaluated argument nodes — the path taken by the
    /// evaluator itself.  `call` is the whole call node, handed to lazy
    /// callbacks (it is what `lambda` captures).
    pub fn call_node_fn(
        &self,
        f: Value<'a>,
        args: &'a [&'a ParseNode<'a>],
        env: &mut Env<'a>,
        src: Source<'_>,
        call: &'a ParseNode<'a>,
    ) -> Value<'a> {
        match f {
            Value::ExternFn(id) => {
                let (callback, arity) = match self.registry.get(id) {
                    Some(entry) => (entry.callback, entry.arity),
                    None => return Value::Null,
                };
                if !match_arity(args.len(), arity) {
                    return Value::Null;
                }
                match callback {
                    Callback::Lazy(cb) => cb(self, env, args, src, call),
                    Callback::Eager(cb) => {
                        if args.len() > ARG_BUFFER_SIZE {
                            report_arg_overflow(env, args.len());
                            return Value::Null;
                        }
                        let values: Vec<Value<'a>> =
                            args.iter().map(|a| self.eval(a, env, src)).collect();
                        cb(self, env, &values, src)
                    }
                }
            }

            Value::Closure(fn_node) => {
                let Some((params, body)) = closure_signature(fn_node, args.len()) else {
                    return Value::Null;
                };
                for (param, arg) in params.iter().zip(args.iter()) {
                    let value = self.eval(arg, env, src);
                    let NodeKind::Sym(name) = param.kind else {
                        return Value::Null;
                    };
                    if !env.set(name, value, false) {
                        // A parameter name collided with a const binding.
                        return Value::Null;
                    }
                }
                self.eval(body, env, src)
            }

            _ => Value::Null,
        }
    }

    /// Call `f` with already-evaluated values — the path taken by host
    /// operators such as `map` and `filter`.  Lazy extern functions cannot
    /// be called this way and yield Null.
    pub fn call_value_fn(
        &self,
        f: Value<'a>,
        args: &[Value<'a>],
        env: &mut Env<'a>,
        src: Source<'_>,
    ) -> Value<'a> {
        match f {
            Value::ExternFn(id) => {
                let (callback, arity) = match self.registry.get(id) {
                    Some(entry) => (entry.callback, entry.arity),
                    None => return Value::Null,
                };
                if !match_arity(args.len(), arity) {
                    return Value::Null;
                }
                match callback {
                    Callback::Lazy(_) => Value::Null,
                    Callback::Eager(cb) => {
                        if args.len() > ARG_BUFFER_SIZE {
                            report_arg_overflow(env, args.len());
                            return Value::Null;
                        }
                        cb(self, env, args, src)
                    }
                }
            }

            Value::Closure(fn_node) => {
                let Some((params, body)) = closure_signature(fn_node, args.len()) else {
                    return Value::Null;
                };
                for (param, value) in params.iter().zip(args.iter()) {
                    let NodeKind::Sym(name) = param.kind else {
                        return Value::Null;
                    };
                    if !env.set(name, value.clone(), false) {
                        return Value::Null;
                    }
                }
                self.eval(body, env, src)
            }

            _ => Value::Null,
        }
    }
}

/// Split a closure's defining call node into (parameter nodes, body node),
/// checking the exact arity: parameter count plus body must equal the
/// declared argument count.
fn closure_signature<'a>(
    fn_node: &'a ParseNode<'a>,
    n_args: usize,
) -> Option<(&'a [&'a ParseNode<'a>], &'a ParseNode<'a>)> {
    let NodeKind::Call { args: decl, .. } = fn_node.kind else {
        return None;
    };
    if n_args + 1 != decl.len() {
        return None;
    }
    Some((&decl[..n_args], decl[n_args]))
}

fn report_arg_overflow(env: &Env<'_>, n_args: usize) {
    let mut err = env.err();
    let _ = writeln!(
        err,
        "Error: Argument count ({n_args}) exceeds argument buffer size ({ARG_BUFFER_SIZE})."
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
