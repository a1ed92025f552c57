//! lish — a small embeddable scripting language with a shell escape hatch.
//!
//! Programs are prefix-call expressions: `(+ 1 2 3)` and the unparenthesized
//! command form `+ 1 2 3` are the same call.  Values are dynamically typed
//! (null, integer, string, array, function), variables are dereferenced with
//! a sigil (`$x`), and `do … end` sequences expressions.  A call whose head
//! is not bound in the environment falls back to running an external
//! program, which is what makes the interactive prompt usable as a shell.
//!
//! Host code extends the language by registering extern functions through
//! [`lang::Interp::register_lazy`] / [`lang::Interp::register_eager`] and
//! binding the returned handles into an environment; the bundled [`stdlib`]
//! is built exclusively on that interface.
//!
//! # Quick start
//!
//! ```rust
//! use lish::arena::Arena;
//! use lish::lang::{parser, Env, Interp, Source};
//!
//! let arena = Arena::new();
//! let mut interp = Interp::new();
//! let bindings = lish::stdlib::load_all(&mut interp);
//! let mut env = Env::new();
//! lish::stdlib::install(&bindings, &mut env);
//!
//! let src = Source { name: "demo", text: "+ 1 2 3" };
//! let tree = parser::parse(&arena, src).expr.unwrap();
//! let result = interp.eval(tree, &mut env, src);
//! assert_eq!(result.to_string(), "6");
//! ```

pub mod arena;
pub mod cli;
pub mod config;
pub mod input;
pub mod lang;
pub mod stdlib;
