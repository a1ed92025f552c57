//! External-command fallback.
//!
//! A call whose head symbol has no environment binding is treated as an
//! external program: the head becomes `argv[0]` and each evaluated argument
//! is stringified into one argv entry (array arguments flatten, one entry
//! per element).  The assembled command line is echoed, optionally gated
//! behind an interactive approval prompt, and then spawned with the
//! environment's current stream redirections.

use std::io::Write;
use std::process::Command;

use crate::config;
use crate::input;
use super::env::Env;
use super::value::{render_bounded, Value};

/// Total byte budget for stringified arguments (argv[0] is not counted).
pub const ARG_STRING_BUFFER_SIZE: usize = 1024;

/// Child was terminated by a signal.
pub const STATUS_SIGNALED: i32 = -2;
/// The child could not be spawned at all (program missing, fork failure),
/// or the spawn was skipped (argument overflow, approval declined).
pub const STATUS_SPAWN_FAILED: i32 = -1;

// ── argv assembly ─────────────────────────────────────────────────────────────

/// Build the argv for `cmd` applied to `args`.  Array values contribute one
/// entry per element.  Fails when the stringified arguments exceed the
/// shared buffer budget.
pub fn build_argv(cmd: &str, args: &[Value<'_>]) -> Result<Vec<String>, String> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(cmd.to_owned());

    let mut budget = ARG_STRING_BUFFER_SIZE;
    let mut push = |value: &Value<'_>, argv: &mut Vec<String>| -> bool {
        // Each entry costs its rendering plus a terminator byte.
        let Some(limit) = budget.checked_sub(1) else {
            return false;
        };
        let Some(text) = render_bounded(value, limit) else {
            return false;
        };
        budget -= text.len() + 1;
        argv.push(text);
        true
    };

    for arg in args {
        let fits = match arg {
            Value::Array(items) => items.iter().all(|item| push(item, &mut argv)),
            other => push(other, &mut argv),
        };
        if !fits {
            return Err(format!(
                "Unable to execute command: Arguments don't fit into string buffer ({ARG_STRING_BUFFER_SIZE} bytes)"
            ));
        }
    }

    Ok(argv)
}

// ── Spawn ─────────────────────────────────────────────────────────────────────

/// Execute `cmd` with `args` as an external program.
///
/// Returns the child's exit code (0–255), [`STATUS_SIGNALED`] when it was
/// killed by a signal, or [`STATUS_SPAWN_FAILED`] when nothing ran.
pub fn run_command<'a>(cmd: &str, args: &[Value<'a>], env: &mut Env<'a>) -> i32 {
    let argv = match build_argv(cmd, args) {
        Ok(argv) => argv,
        Err(message) => {
            let mut err = env.err();
            let _ = writeln!(err, "{message}");
            return STATUS_SPAWN_FAILED;
        }
    };

    // Echo the command line before anything runs.
    println!("COM ({}): {}", cmd, argv.join(" "));

    if config::get().approve_commands && !input::yes_or_no(Some("Approve?")) {
        // Declining is a no-op, not an error.
        return STATUS_SPAWN_FAILED;
    }

    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);
    if let Some(stdout) = env.out().as_stdio() {
        command.stdout(stdout);
    }
    if let Some(stdin) = env.input().as_stdio() {
        command.stdin(stdin);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            let mut err = env.err();
            let _ = writeln!(err, "Unable to exec '{}': {}", argv[0], e);
            return STATUS_SPAWN_FAILED;
        }
    };

    // Blocks until the child exits; interrupted waits are retried and
    // stopped children do not end the wait.
    match child.wait() {
        // `code()` is None exactly when a signal terminated the child.
        Ok(status) => status.code().unwrap_or(STATUS_SIGNALED),
        Err(e) => {
            let mut err = env.err();
            let _ = writeln!(err, "Unable to wait for '{}': {}", argv[0], e);
            STATUS_SPAWN_FAILED
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};
    use std::rc::Rc;

    use crate::lang::env::OutStream;

    #[test]
    fn argv_head_is_the_command() {
        let argv = build_argv("ls", &[Value::str("-la")]).unwrap();
        assert_eq!(argv, ["ls", "-la"]);
    }

    #[test]
    fn argv_stringifies_ints() {
        let argv = build_argv("sleep", &[Value::Int(3)]).unwrap();
        assert_eq!(argv, ["sleep", "3"]);
    }

    #[test]
    fn argv_flattens_arrays() {
        let files = Value::array(vec![Value::str("a.txt"), Value::str("b.txt")]);
        let argv = build_argv("rm", &[files, Value::str("-f")]).unwrap();
        assert_eq!(argv, ["rm", "a.txt", "b.txt", "-f"]);
    }

    #[test]
    fn argv_renders_null_as_empty_entry() {
        let argv = build_argv("printf", &[Value::Null]).unwrap();
        assert_eq!(argv, ["printf", ""]);
    }

    #[test]
    fn argv_overflow_is_an_error() {
        let big = "x".repeat(600);
        let args = [Value::str(&big), Value::str(&big)];
        let err = build_argv("cat", &args).unwrap_err();
        assert!(err.contains("string buffer"));
    }

    #[test]
    fn argv_budget_excludes_argv0() {
        // A command name longer than the whole budget is still fine.
        let long_cmd = "c".repeat(2000);
        let argv = build_argv(&long_cmd, &[]).unwrap();
        assert_eq!(argv.len(), 1);
    }

    #[test]
    fn exit_codes_are_reported() {
        let mut env = Env::new();
        assert_eq!(run_command("true", &[], &mut env), 0);
        assert_eq!(run_command("false", &[], &mut env), 1);
    }

    #[test]
    fn missing_program_fails_spawn() {
        let mut env = Env::new();
        let status = run_command("definitely-not-a-real-program-3141", &[], &mut env);
        assert_eq!(status, STATUS_SPAWN_FAILED);
    }

    #[test]
    fn child_stdout_follows_redirection() {
        let mut env = Env::new();
        let file = tempfile::tempfile().unwrap();
        let rc = Rc::new(file);
        env.set_out(OutStream::File(rc.clone()));

        let status = run_command("echo", &[Value::str("redirected")], &mut env);
        assert_eq!(status, 0);

        let mut text = String::new();
        let mut reader = rc.try_clone().unwrap();
        reader.seek(SeekFrom::Start(0)).unwrap();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "redirected\n");
    }
}
