//! Core operators: binding, arithmetic, printing, control flow, functions,
//! arrays, and the host-facing operators (`cd`, `open`, `readline`, `indir`,
//! `getenv`, `setenv`).
//!
//! Control-flow and binding operators register as lazy-node callbacks so
//! they control which arguments get evaluated; the rest take evaluated
//! values.  Arithmetic is integer-only — any non-integer operand collapses
//! the whole operation to Null.

use std::fs::File;
use std::io::Write;
use std::rc::Rc;

use crate::config;
use crate::input;
use crate::lang::diag::{Diagnostic, Source};
use crate::lang::env::{Env, InStream, OutStream};
use crate::lang::interp::Interp;
use crate::lang::parser::{NodeKind, ParseNode};
use crate::lang::value::{render_bounded, Value};
use super::Bindings;

/// Write a located complaint about `node` to the environment's error stream.
fn blame(env: &Env<'_>, src: Source<'_>, node: &ParseNode<'_>, message: String) {
    let mut err = env.err();
    let _ = write!(err, "{}", Diagnostic::error(message, node.span).render(src));
}

// ── Binding ───────────────────────────────────────────────────────────────────

fn op_let<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let NodeKind::Sym(name) = args[0].kind else {
        blame(
            env,
            src,
            args[0],
            format!("Expected symbol as variable name, got {}.", args[0].describe()),
        );
        return Value::Null;
    };

    let value = interp.eval(args[1], env, src);
    if !env.set(name, value.clone(), false) {
        let mut err = env.err();
        let _ = writeln!(err, "Cannot redefine constant '{name}'");
        return Value::Null;
    }
    value
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

fn op_add<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let mut sum: i64 = 0;
    for arg in args {
        let Value::Int(v) = interp.eval(arg, env, src) else {
            return Value::Null;
        };
        sum = sum.wrapping_add(v);
    }
    Value::Int(sum)
}

fn op_sub<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let Value::Int(first) = interp.eval(args[0], env, src) else {
        return Value::Null;
    };
    // A single operand negates.
    if args.len() == 1 {
        return Value::Int(first.wrapping_neg());
    }
    let mut diff = first;
    for arg in &args[1..] {
        let Value::Int(v) = interp.eval(arg, env, src) else {
            return Value::Null;
        };
        diff = diff.wrapping_sub(v);
    }
    Value::Int(diff)
}

fn op_mul<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let mut product: i64 = 1;
    for arg in args {
        let Value::Int(v) = interp.eval(arg, env, src) else {
            return Value::Null;
        };
        product = product.wrapping_mul(v);
    }
    Value::Int(product)
}

fn op_div<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let Value::Int(first) = interp.eval(args[0], env, src) else {
        return Value::Null;
    };
    let mut quotient = first;
    for arg in &args[1..] {
        let Value::Int(v) = interp.eval(arg, env, src) else {
            return Value::Null;
        };
        if v == 0 {
            let mut err = env.err();
            let _ = writeln!(err, "Division by zero");
            return Value::Null;
        }
        quotient = quotient.wrapping_div(v);
    }
    Value::Int(quotient)
}

// ── Printing ──────────────────────────────────────────────────────────────────

fn op_print<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let mut out = env.out();
    for (i, arg) in args.iter().enumerate() {
        let value = interp.eval(arg, env, src);
        if i > 0 {
            let _ = write!(out, " ");
        }
        let _ = write!(out, "{value}");
    }
    let _ = writeln!(out);
    let _ = out.flush();
    Value::Null
}

fn op_printf<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let format = interp.eval(args[0], env, src);
    let values: Vec<Value<'a>> = args[1..]
        .iter()
        .map(|a| interp.eval(a, env, src))
        .collect();

    let Value::Str(format) = format else {
        return Value::Null;
    };

    // `%0`…`%9` insert an argument, `%n` a newline; any other `%`-escape is
    // dropped.
    let mut out = env.out();
    let bytes = format.as_bytes();
    let mut plain_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let _ = out.write_all(&bytes[plain_start..i]);
            i += 1;
            if i == bytes.len() {
                plain_start = i;
                break;
            }
            let c = bytes[i];
            if c.is_ascii_digit() {
                let index = (c - b'0') as usize;
                if index < values.len() {
                    let _ = write!(out, "{}", values[index]);
                }
            } else if c == b'n' {
                let _ = writeln!(out);
            }
            i += 1;
            plain_start = i;
        } else {
            i += 1;
        }
    }
    let _ = out.write_all(&bytes[plain_start..]);
    let _ = out.flush();
    Value::Null
}

// ── Functions and control flow ────────────────────────────────────────────────

fn op_lambda<'a>(
    _interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    call: &'a ParseNode<'a>,
) -> Value<'a> {
    // All arguments except the last (the body) must be parameter names.
    for param in &args[..args.len() - 1] {
        if !matches!(param.kind, NodeKind::Sym(_)) {
            blame(
                env,
                src,
                param,
                format!("Invalid function argument name: '{}'", param.describe()),
            );
            return Value::Null;
        }
    }
    Value::Closure(call)
}

fn op_if<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let cond = interp.eval(args[0], env, src);
    if cond.truthy() {
        interp.eval(args[1], env, src)
    } else if args.len() < 3 {
        Value::Null
    } else {
        interp.eval(args[2], env, src)
    }
}

fn op_do<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let mut result = Value::Null;
    for arg in args {
        result = interp.eval(arg, env, src);
    }
    result
}

// ── Comparison ────────────────────────────────────────────────────────────────

fn op_eq<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let all_equal = args[1..].iter().all(|v| args[0].eq_value(v));
    Value::Int(all_equal as i64)
}

fn op_less<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let ascending = args.windows(2).all(|w| w[0].less_than(&w[1]));
    Value::Int(ascending as i64)
}

fn op_greater<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let descending = args.windows(2).all(|w| w[0].greater_than(&w[1]));
    Value::Int(descending as i64)
}

// ── Arrays ────────────────────────────────────────────────────────────────────

fn op_array<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    Value::array(args.to_vec())
}

fn op_map<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &[Value<'a>],
    src: Source<'_>,
) -> Value<'a> {
    let Value::Array(items) = &args[0] else {
        return Value::Null;
    };
    let f = &args[1];
    let mapped: Vec<Value<'a>> = items
        .iter()
        .map(|item| interp.call_value_fn(f.clone(), &[item.clone()], env, src))
        .collect();
    Value::array(mapped)
}

fn op_filter<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &[Value<'a>],
    src: Source<'_>,
) -> Value<'a> {
    let Value::Array(items) = &args[0] else {
        return Value::Null;
    };
    let f = &args[1];
    let mut kept: Vec<Value<'a>> = Vec::new();
    for item in items.iter() {
        let keep = interp.call_value_fn(f.clone(), &[item.clone()], env, src);
        if keep.truthy() {
            kept.push(item.clone());
        }
    }
    Value::array(kept)
}

fn op_index<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let (Value::Array(items), Value::Int(index)) = (&args[0], &args[1]) else {
        return Value::Null;
    };
    let len = items.len() as i64;
    if *index >= len {
        return Value::Null;
    }
    // A negative index counts from the end.
    let index = if *index < 0 { (len + index) % len } else { *index };
    if index < 0 {
        return Value::Null;
    }
    items[index as usize].clone()
}

// ── Host-facing operators ─────────────────────────────────────────────────────

fn op_cd<'a>(
    _interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    if let Some(path) = render_bounded(&args[0], 511) {
        if let Err(e) = std::env::set_current_dir(&path) {
            let mut err = env.err();
            let _ = writeln!(err, "Unable to change working directory to '{path}': {e}");
        }
    }
    Value::Null
}

fn op_open<'a>(
    interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &'a [&'a ParseNode<'a>],
    src: Source<'_>,
    _call: &'a ParseNode<'a>,
) -> Value<'a> {
    let path = interp.eval(args[0], env, src);
    let mode = interp.eval(args[1], env, src);
    let (Value::Str(path), Value::Str(mode)) = (&path, &mode) else {
        return Value::Null;
    };
    if !matches!(&**mode, "r" | "w") {
        return Value::Null;
    }

    if config::get().approve_commands {
        print!("Attempting to open {path} (mode {mode}), ");
        let _ = std::io::stdout().flush();
        if !input::yes_or_no(None) {
            let mut err = env.err();
            let _ = writeln!(err, "Unable to open file '{path}' ({mode}): Manually denied");
            return Value::Null;
        }
    }

    let file = if &**mode == "r" {
        File::open(&**path)
    } else {
        File::create(&**path)
    };
    let file = match file {
        Ok(f) => Rc::new(f),
        Err(e) => {
            let mut err = env.err();
            let _ = writeln!(err, "Unable to open file '{path}' ({mode}): {e}");
            return Value::Null;
        }
    };

    // Swap the stream for the duration of the body, then restore.
    if &**mode == "r" {
        let previous = env.set_input(InStream::File(file));
        let _ = interp.eval(args[2], env, src);
        env.set_input(previous);
    } else {
        let previous = env.set_out(OutStream::File(file));
        let _ = interp.eval(args[2], env, src);
        env.set_out(previous);
    }
    Value::Null
}

fn op_readline<'a>(
    _interp: &Interp<'a>,
    env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    if !args[0].is_null() {
        let mut out = env.out();
        let _ = write!(out, "{}", args[0]);
        let _ = out.flush();
    }
    match env.input().read_line() {
        Ok(Some(line)) => Value::str(&line),
        _ => Value::Null,
    }
}

fn collect_files(dir: &std::path::Path, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let kind = entry.file_type()?;
        if kind.is_dir() {
            collect_files(&entry.path(), out)?;
        } else if kind.is_file() {
            out.push(entry.path().to_string_lossy().into_owned());
        }
    }
    Ok(())
}

fn op_indir<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let Value::Str(path) = &args[0] else {
        return Value::Null;
    };
    let path = std::path::Path::new(&**path);
    let mut files = Vec::new();
    if path.is_file() {
        files.push(path.to_string_lossy().into_owned());
    } else if collect_files(path, &mut files).is_err() {
        return Value::Null;
    }
    Value::array(files.iter().map(|p| Value::str(p)).collect())
}

fn op_getenv<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let Value::Str(name) = &args[0] else {
        return Value::Null;
    };
    match std::env::var(&**name) {
        Ok(value) => Value::str(&value),
        Err(_) => Value::Null,
    }
}

fn op_setenv<'a>(
    _interp: &Interp<'a>,
    _env: &mut Env<'a>,
    args: &[Value<'a>],
    _src: Source<'_>,
) -> Value<'a> {
    let Value::Str(name) = &args[0] else {
        return Value::Null;
    };
    let Some(value) = render_bounded(&args[1], 1023) else {
        return Value::Null;
    };
    std::env::set_var(&**name, value);
    args[1].clone()
}

// ── Registration ──────────────────────────────────────────────────────────────

/// Register the core operators and return their bindings.
pub fn load<'a>(interp: &mut Interp<'a>) -> Bindings<'a> {
    let mut bindings: Bindings<'a> = vec![
        ("let", interp.register_lazy("let", 2, op_let)),
        ("+", interp.register_lazy("+", -1, op_add)),
        ("print", interp.register_lazy("print", -1, op_print)),
    ];

    let lambda = interp.register_lazy("lambda", -2, op_lambda);
    for alias in ["lambda", "^", "\\", "!", "λ"] {
        bindings.push((alias, lambda.clone()));
    }

    bindings.extend([
        ("-", interp.register_lazy("-", -2, op_sub)),
        ("*", interp.register_lazy("*", -1, op_mul)),
        ("/", interp.register_lazy("/", -2, op_div)),
        ("cd", interp.register_eager("cd", 1, op_cd)),
        ("printf", interp.register_lazy("printf", -2, op_printf)),
        ("if", interp.register_lazy("if", -3, op_if)),
        ("=", interp.register_eager("=", -3, op_eq)),
        ("<", interp.register_eager("<", -3, op_less)),
        (">", interp.register_eager(">", -3, op_greater)),
        ("do", interp.register_lazy("do", -1, op_do)),
        ("array", interp.register_eager("array", -1, op_array)),
        ("map", interp.register_eager("map", 2, op_map)),
        ("filter", interp.register_eager("filter", 2, op_filter)),
        ("open", interp.register_lazy("open", 3, op_open)),
        ("readline", interp.register_eager("readline", 1, op_readline)),
        ("indir", interp.register_eager("indir", 1, op_indir)),
        ("getenv", interp.register_eager("getenv", 1, op_getenv)),
        ("setenv", interp.register_eager("setenv", 2, op_setenv)),
        ("index", interp.register_eager("index", 2, op_index)),
    ]);

    bindings
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::stdlib::testing::{output_of, result_of, run};

    #[test]
    fn arithmetic() {
        assert_eq!(result_of("+ 1 2 3"), "6");
        assert_eq!(result_of("(+ 1 2 3)"), "6");
        assert_eq!(result_of("- 10 3 2"), "5");
        assert_eq!(result_of("- 4"), "-4");
        assert_eq!(result_of("* 2 3 4"), "24");
        assert_eq!(result_of("/ 20 2 5"), "2");
    }

    #[test]
    fn arithmetic_on_non_int_is_null() {
        assert_eq!(result_of("+ 1 two"), "Null");
        assert_eq!(result_of("/ 1 0"), "Null");
    }

    #[test]
    fn let_binds_and_returns() {
        let (results, _) = run(&["let x 5", "$x"]);
        assert_eq!(results, ["5", "5"]);
    }

    #[test]
    fn let_rejects_const_names() {
        // Stdlib bindings are consts; `print` must survive the overwrite.
        let (results, output) = run(&["let print 1", "print ok"]);
        assert_eq!(results[0], "Null");
        assert_eq!(output, "ok\n");
    }

    #[test]
    fn let_requires_a_symbol_name() {
        assert_eq!(result_of("let 5 6"), "Null");
    }

    #[test]
    fn symbols_evaluate_to_strings() {
        assert_eq!(result_of("let x hello"), "hello");
    }

    #[test]
    fn print_joins_with_spaces() {
        assert_eq!(output_of(&["print a b 3"]), "a b 3\n");
    }

    #[test]
    fn block_prints_in_order_and_returns_last() {
        let (results, output) = run(&["do print 1, print 2 end"]);
        assert_eq!(output, "1\n2\n");
        // `print` itself evaluates to Null.
        assert_eq!(results[0], "Null");
    }

    #[test]
    fn do_operator_returns_last_value() {
        assert_eq!(result_of("(do 1 2 3)"), "3");
    }

    #[test]
    fn printf_formats() {
        assert_eq!(output_of(&["printf \"a=%0, b=%1%n\" 5 rest"]), "a=5, b=rest\n");
        // Out-of-range argument references and unknown escapes are dropped.
        assert_eq!(output_of(&["printf \"%5x%n\" a"]), "x\n");
    }

    #[test]
    fn if_branches() {
        assert_eq!(result_of("if 1 yes no"), "yes");
        assert_eq!(result_of("if 0 yes no"), "no");
        assert_eq!(result_of("if 0 yes"), "Null");
        assert_eq!(result_of("if \"\" yes no"), "no");
    }

    #[test]
    fn comparisons() {
        assert_eq!(result_of("= 1 1 1"), "1");
        assert_eq!(result_of("= 1 2"), "0");
        assert_eq!(result_of("= a a"), "1");
        assert_eq!(result_of("< 1 2 3"), "1");
        assert_eq!(result_of("< 1 3 2"), "0");
        assert_eq!(result_of("> 3 2 1"), "1");
    }

    #[test]
    fn lambda_and_call() {
        let (results, _) = run(&["let double (lambda n (* $n 2))", "double 21"]);
        assert_eq!(results[1], "42");
    }

    #[test]
    fn lambda_aliases() {
        assert_eq!(result_of("((^ n (+ $n 1)) 5)"), "6");
        assert_eq!(result_of("((λ n (+ $n 1)) 5)"), "6");
    }

    #[test]
    fn lambda_arity_is_exact() {
        let (results, _) = run(&["let f (lambda a b (+ $a $b))", "f 1", "f 1 2 3", "f 1 2"]);
        assert_eq!(results[1..], ["Null", "Null", "3"]);
    }

    #[test]
    fn lambda_rejects_non_symbol_params() {
        assert_eq!(result_of("lambda 1 (+ 1 2)"), "Null");
    }

    #[test]
    fn closures_see_caller_bindings() {
        // One flat scope: the parameter binding lands in the caller's
        // environment and stays visible after the call.
        let (results, _) = run(&["let f (lambda n (+ $n 1))", "f 9", "$n"]);
        assert_eq!(results[1..], ["10", "9"]);
    }

    #[test]
    fn arrays() {
        assert_eq!(result_of("array 1 2 3"), "(1 2 3)");
        assert_eq!(result_of("index (array a b c) 1"), "b");
        assert_eq!(result_of("index (array a b c) -1"), "c");
        assert_eq!(result_of("index (array a b c) 9"), "Null");
    }

    #[test]
    fn map_and_filter() {
        assert_eq!(
            result_of("map (array 1 2 3) (lambda n (* $n $n))"),
            "(1 4 9)"
        );
        assert_eq!(
            result_of("filter (array 1 0 2 0 3) (lambda n $n)"),
            "(1 2 3)"
        );
        assert_eq!(result_of("map 5 (lambda n $n)"), "Null");
    }

    #[test]
    fn getenv_and_setenv() {
        let (results, _) = run(&["setenv LISH_TEST_VAR abc123", "getenv LISH_TEST_VAR"]);
        assert_eq!(results, ["abc123", "abc123"]);
        assert_eq!(result_of("getenv LISH_TEST_VAR_MISSING"), "Null");
    }

    #[test]
    fn open_redirects_print_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let script = format!("open \"{}\" w (print hello)", path.display());
        let (results, captured) = run(&[&script]);
        assert_eq!(results[0], "Null");
        // The print went to the file, not the environment's stream.
        assert_eq!(captured, "");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn open_read_feeds_readline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.txt");
        std::fs::write(&path, "line one\nline two\n").unwrap();
        // `$unbound` supplies a Null prompt argument.
        let script = format!("open \"{}\" r (print (readline $unbound))", path.display());
        let (_, captured) = run(&[&script]);
        assert_eq!(captured, "line one\n");
    }

    #[test]
    fn open_missing_file_is_null() {
        assert_eq!(result_of("open /no/such/file-3141 r (print x)"), "Null");
    }

    #[test]
    fn indir_lists_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), "").unwrap();
        let script = format!("indir \"{}\"", dir.path().display());
        let listed = result_of(&script);
        assert!(listed.contains("a.txt"));
        assert!(listed.contains("b.txt"));
    }
}
