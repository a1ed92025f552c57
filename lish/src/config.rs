//! Write-once runtime configuration.
//!
//! The configuration is fixed at startup: the first [`init`] wins and every
//! later write is ignored.  Reads before any write see the defaults.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// Require an interactive y/n confirmation before spawning an external
    /// command or opening a file for redirection.
    pub approve_commands: bool,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Install the configuration.  Returns `false` (and changes nothing) if a
/// configuration was already installed.
pub fn init(config: Config) -> bool {
    CONFIG.set(config).is_ok()
}

/// Read the current configuration (defaults if [`init`] was never called).
pub fn get() -> Config {
    CONFIG.get().copied().unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
