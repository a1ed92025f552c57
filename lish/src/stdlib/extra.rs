//! Destructuring binding: `lets (a b c) expr` binds the elements of an
//! array result to several names at once.

use crate::lang::diag::Source;
use crate::lang::env::Env;
use crate::lang::interp::Interp;
use crate::lang::parser::{NodeKind, ParseNode};
use crate::lang::value::Value;
use super::Bindings;

fn op_lets<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let value = interp.eval(args[1], env, src);
    let Value::Array(items) = &value else {
        return Value::Null;
    };

    // The name list parses as a call shape: `(a b c)` is operator `a` with
    // arguments `b c` — all must be plain symbols.
    let NodeKind::Call { op, args: rest } = args[0].kind else {
        return Value::Null;
    };
    let NodeKind::Sym(first) = op.kind else {
        return Value::Null;
    };
    if rest.len() + 1 != items.len() {
        return Value::Null;
    }
    if rest.iter().any(|n| !matches!(n.kind, NodeKind::Sym(_))) {
        return Value::Null;
    }

    env.set(first, items[0].clone(), false);
    for (i, node) in rest.iter().enumerate() {
        let NodeKind::Sym(name) = node.kind else {
            unreachable!();
        };
        env.set(name, items[i + 1].clone(), false);
    }
    value
}

// ── Registration ──────────────────────────────────────────────────────────────

pub fn load<'a>(interp: &mut Interp<'a>) -> Bindings<'a> {
    vec![("lets", interp.register_lazy("lets", 2, op_lets))]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
