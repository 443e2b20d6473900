//! Diagnostic logging via `tracing`.
//!
//! User-facing progress goes through [`crate::status!`]; this layer carries
//! debug detail (requests, reply parsing) and model warnings on stderr.

use tracing_subscriber::EnvFilter;

use crate::config::Environment;
use crate::output;

/// Environment variable holding the log filter (e.g. `debug`).
pub const LOG_ENV: &str = "KANJI_CHECK_LOG";

/// Installs the global subscriber. `verbose` forces debug output for this crate.
pub fn init(verbose: bool, env: &Environment) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, env))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!output::is_no_color())
        .try_init();
}

/// The filter for this run: `-v`, then `KANJI_CHECK_LOG`, then `warn`.
/// An unparseable `KANJI_CHECK_LOG` also falls back to `warn`.
fn filter(verbose: bool, env: &Environment) -> EnvFilter {
    if verbose {
        return EnvFilter::new("kanji_check=debug");
    }

    env.get(LOG_ENV)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
