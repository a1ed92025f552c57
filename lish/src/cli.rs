//! Command-line argument parsing.
//!
//! Usage:
//!   lish [--manual-approve | --no-manual-approve]
//!        [--terminal-rich | --terminal-basic]
//!        [-V | --version]
//!        [<script> [args…]]
//!
//! The first non-flag argument is a script path; everything after it is
//! passed through to the script untouched (as its `argv`, with the path
//! itself as element zero).

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Print version and exit (`-V` / `--version`).
    pub version: bool,
    /// Override for the command-approval policy; `None` keeps the default.
    pub approve: Option<bool>,
    /// Override for styled terminal output; `None` means auto-detect.
    pub rich: Option<bool>,
    /// Script to run instead of the interactive prompt.
    pub script: Option<String>,
    /// The script's `argv`, starting with the script path itself.
    pub script_args: Vec<String>,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();

    for (i, arg) in argv.iter().enumerate() {
        if !arg.starts_with('-') {
            // A script path; the rest belongs to the script.
            args.script = Some(arg.clone());
            args.script_args = argv[i..].to_vec();
            break;
        }
        match arg.as_str() {
            "-V" | "--version" => args.version = true,
            "--manual-approve" => args.approve = Some(true),
            "--no-manual-approve" => args.approve = Some(false),
            "--terminal-rich" => args.rich = Some(true),
            "--terminal-basic" => args.rich = Some(false),
            other => return Err(format!("unknown option -- '{other}'")),
        }
    }

    Ok(args)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
