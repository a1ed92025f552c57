//! Tests driving the built binary: the piped (non-interactive) prompt and
//! script-file execution with an `argv` binding.

use std::io::Write;
use std::process::{Command, Stdio};

fn lish() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lish"))
}

fn run_piped(args: &[&str], stdin_text: &str) -> (String, String, i32) {
    let mut child = lish()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn lish");
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin_text.as_bytes())
        .unwrap();
    let out = child.wait_with_output().expect("wait");
    (
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
        out.status.code().unwrap_or(-1),
    )
}

#[test]
fn version_flag() {
    let (stdout, _, code) = run_piped(&["--version"], "");
    assert!(stdout.contains("lish, version"));
    assert_eq!(code, 0);
}

#[test]
fn unknown_flag_fails_with_usage() {
    let (_, stderr, code) = run_piped(&["--nope"], "");
    assert!(stderr.contains("Usage"));
    assert_eq!(code, 1);
}

#[test]
fn piped_prompt_evaluates_and_echoes_results() {
    let (stdout, _, code) = run_piped(&["--terminal-basic"], "+ 1 2\nquit\n");
    // The result is echoed right after the prompt text.
    assert!(stdout.contains("lish: 3"), "stdout was: {stdout}");
    assert_eq!(code, 0);
}

#[test]
fn prompt_reports_parse_errors_and_continues() {
    let (stdout, stderr, code) =
        run_piped(&["--terminal-basic"], ")\n+ 2 2\nquit\n");
    assert!(stderr.contains("Unexpected token"));
    assert!(stdout.contains("lish: 4"));
    assert_eq!(code, 0);
}

#[test]
fn null_results_are_not_echoed() {
    let (stdout, _, _) = run_piped(&["--terminal-basic"], "$missing\nquit\n");
    assert!(!stdout.contains("Null"));
}

#[test]
fn script_file_runs_with_argv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("args.lish");
    std::fs::write(&path, "print (index $argv 1)\n").unwrap();

    let (stdout, _, code) = run_piped(
        &["--no-manual-approve", path.to_str().unwrap(), "first-arg"],
        "",
    );
    assert_eq!(stdout, "first-arg\n");
    assert_eq!(code, 0);
}

#[test]
fn script_parse_error_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.lish");
    std::fs::write(&path, "(print 1\n").unwrap();

    let (_, stderr, code) = run_piped(&[path.to_str().unwrap()], "");
    assert_ne!(code, 0);
    assert!(!stderr.is_empty());
}

#[test]
fn missing_script_exits_nonzero() {
    let (_, stderr, code) = run_piped(&["/no/such/script-2718.lish"], "");
    assert_eq!(code, 1);
    assert!(stderr.contains("no/such"));
}

#[test]
fn script_can_spawn_external_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spawn.lish");
    std::fs::write(&path, "echo spawned-ok\n").unwrap();

    let (stdout, _, code) = run_piped(&[path.to_str().unwrap()], "");
    // Both the command-line echo and the child's output appear.
    assert!(stdout.contains("COM (echo): echo spawned-ok"));
    assert!(stdout.contains("spawned-ok"));
    assert_eq!(code, 0);
}
