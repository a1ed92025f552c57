use std::io::Write;

use crossterm::style::Stylize;

use lish::arena::Arena;
use lish::cli;
use lish::config::{self, Config};
use lish::input::{LineSource, StdinLines};
use lish::lang::{parser, Env, Interp, Source, Value};
use lish::stdlib;

/// Default for the command-approval policy when no flag overrides it.
const DEFAULT_APPROVE_COMMANDS: bool = false;

fn print_banner() {
    let ver = env!("CARGO_PKG_VERSION");
    println!("lish, version {ver}");
}

// ── Terminal helpers ──────────────────────────────────────────────────────────

fn stdin_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0 }
}

/// Re-print the prompt after a Ctrl-C instead of dying.  Only
/// async-signal-safe calls are allowed here, so just emit a newline; the
/// read loop prints the next prompt.
extern "C" fn on_sigint(_sig: libc::c_int) {
    let newline = b"\n";
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            newline.as_ptr() as *const libc::c_void,
            newline.len(),
        );
    }
}

fn print_prompt(rich: bool) {
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    if rich {
        print!("{}{} {} ", cwd.dark_cyan(), ">".dark_cyan(), "$ lish:".magenta());
    } else {
        print!("{cwd}> $ lish: ");
    }
    let _ = std::io::stdout().flush();
}

// ── Interactive prompt ────────────────────────────────────────────────────────

fn run_prompt(rich: bool) {
    let handler: extern "C" fn(libc::c_int) = on_sigint;
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }

    print_banner();

    let arena = Arena::new();
    let mut interp = Interp::new();
    let bindings = stdlib::load_all(&mut interp);
    let mut env = Env::new();
    stdlib::install(&bindings, &mut env);

    let mut lines = StdinLines;
    loop {
        print_prompt(rich);
        let Some(line) = lines.read_line() else {
            println!();
            break;
        };
        if line == "quit" || line == "q" {
            break;
        }

        let src = Source {
            name: "stdin",
            text: &line,
        };
        let outcome = parser::parse(&arena, src);
        for diag in &outcome.diagnostics {
            eprint!("{}", diag.render(src));
        }
        let Some(expr) = outcome.expr else {
            continue;
        };

        let result = interp.eval(expr, &mut env, src);
        if !result.is_null() {
            if rich {
                println!("{}", result.to_string().green());
            } else {
                println!("{result}");
            }
        }
    }

    drop(env);
    interp.clear_extern_fns();
}

// ── Script execution ──────────────────────────────────────────────────────────

fn run_script(path: &str, script_args: &[String]) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("lish: {path}: {e}");
            return 1;
        }
    };

    let arena = Arena::new();
    let mut interp = Interp::new();
    let bindings = stdlib::load_all(&mut interp);
    let mut env = Env::new();
    stdlib::install(&bindings, &mut env);

    // The command line from the script path onward, as a const array.
    let argv = Value::array(script_args.iter().map(|a| Value::str(a)).collect());
    env.set("argv", argv, true);

    let src = Source { name: path, text: &text };
    let outcome = parser::parse(&arena, src);
    for diag in &outcome.diagnostics {
        eprint!("{}", diag.render(src));
    }
    let Some(expr) = outcome.expr else {
        return 2;
    };

    let _ = interp.eval(expr, &mut env, src);

    drop(env);
    interp.clear_extern_fns();
    0
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("lish: {e}");
            eprintln!(
                "Usage: lish [--manual-approve|--no-manual-approve] \
                 [--terminal-rich|--terminal-basic] [-V] [<script> [args…]]"
            );
            std::process::exit(1);
        }
    };

    if args.version {
        print_banner();
        return;
    }

    config::init(Config {
        approve_commands: args.approve.unwrap_or(DEFAULT_APPROVE_COMMANDS),
    });

    let status = match args.script {
        Some(path) => run_script(&path, &args.script_args),
        None => {
            let rich = args.rich.unwrap_or_else(stdin_is_tty);
            run_prompt(rich);
            0
        }
    };

    std::process::exit(status);
}
