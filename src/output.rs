//! Process-wide output settings and the stderr message macros.
//!
//! stdout carries only the end-of-run summary. Everything else (progress,
//! spinners, failed-batch lines, fatal errors) is written to stderr so the
//! summary stays clean when redirected.

use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::config::Environment;

static SETTINGS: OnceLock<OutputConfig> = OnceLock::new();

/// How the CLI talks to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Drop progress lines and spinners.
    pub quiet: bool,
    /// Emit plain text without ANSI styling.
    pub no_color: bool,
}

impl OutputConfig {
    /// Combines the command-line flags with the captured environment.
    ///
    /// Colour is turned off by `--no-color`, by a set `NO_COLOR`
    /// (<https://no-color.org/>), or when stdout is not a terminal.
    pub fn from_flags(quiet: bool, no_color: bool, env: &Environment) -> Self {
        let piped = !std::io::stdout().is_terminal();
        Self::with_terminal(quiet, no_color, env, piped)
    }

    fn with_terminal(quiet: bool, no_color: bool, env: &Environment, piped: bool) -> Self {
        Self {
            quiet,
            no_color: no_color || env.get("NO_COLOR").is_some() || piped,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_flags(false, false, &Environment::default())
    }
}

/// Installs the settings for this process. Only the first call has an effect.
pub fn init(config: OutputConfig) {
    let _ = SETTINGS.set(config);
}

/// Current settings, falling back to [`OutputConfig::default`] before `init`.
pub fn config() -> OutputConfig {
    *SETTINGS.get_or_init(OutputConfig::default)
}

pub fn is_quiet() -> bool {
    config().quiet
}

pub fn is_no_color() -> bool {
    config().no_color
}

/// Writes a progress line to stderr unless quiet mode is on.
#[macro_export]
macro_rules! status {
    ($($arg:tt)*) => {
        if !$crate::output::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

/// Writes a line to stderr even in quiet mode. Used for failures.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}
