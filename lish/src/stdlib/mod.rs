//! The standard operator library.
//!
//! Every operator here goes through the public extern-function ABI — nothing
//! in this module touches evaluator internals.  A host embedding the runtime
//! registers its own operators the same way.
//!
//! Loading and binding are separate steps: [`load_all`] registers the
//! callbacks with one runtime instance and returns the handle values;
//! [`install`] binds those handles (as consts) into an environment.  The
//! split lets several environments share one registry.

pub mod basic;
pub mod extra;
pub mod strutils;

use crate::lang::env::Env;
use crate::lang::interp::Interp;
use crate::lang::value::Value;

/// Name → handle pairs produced by loading an operator set.
pub type Bindings<'a> = Vec<(&'static str, Value<'a>)>;

/// Register the whole standard library with `interp`.
pub fn load_all<'a>(interp: &mut Interp<'a>) -> Bindings<'a> {
    let mut bindings = basic::load(interp);
    bindings.extend(strutils::load(interp));
    bindings.extend(extra::load(interp));
    bindings
}

/// Bind loaded operators into `env` as const bindings.
pub fn install<'a>(bindings: &Bindings<'a>, env: &mut Env<'a>) {
    for (name, handle) in bindings {
        env.set(name, handle.clone(), true);
    }
}

// ── Test harness ──────────────────────────────────────────────────────────────
