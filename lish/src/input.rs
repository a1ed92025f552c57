//! Line input.
//!
//! The runtime only ever needs "one line of text, or end-of-input" per
//! prompt cycle; [`LineSource`] is that contract.  [`StdinLines`] is the
//! blocking implementation used by the plain prompt and by scripts reading
//! from a pipe.  A rich interactive editor would be another implementation
//! of the same trait, living outside this crate.

use std::io::{self, BufRead, Write};

/// Produces one line of input at a time.
pub trait LineSource {
    /// Read the next line, without its terminator.  `None` signals
    /// end-of-input.
    fn read_line(&mut self) -> Option<String>;
}

/// Blocking line reader over standard input.
#[derive(Debug, Default)]
pub struct StdinLines;

impl LineSource for StdinLines {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                }
                Some(line)
            }
        }
    }
}

/// Interactive y/n confirmation on the terminal, re-asking until the answer
/// starts with one of `y`/`Y`/`n`/`N`.  End-of-input counts as "no".
pub fn yes_or_no(message: Option<&str>) -> bool {
    let mut lines = StdinLines;
    loop {
        match message {
            Some(m) => print!("{m} (y/n):"),
            None => print!("(y/n):"),
        }
        let _ = io::stdout().flush();

        let Some(line) = lines.read_line() else {
            return false;
        };
        match line.trim_start().chars().next() {
            Some('y' | 'Y') => return true,
            Some('n' | 'N') => return false,
            _ => continue,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
