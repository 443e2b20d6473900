use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{
    Backend, ConfigManager, Environment, ResolveOptions, ResolvedConfig, resolve_config,
};
use crate::input::{LoadError, load_pairs};
use crate::output;
use crate::report::{Summary, write_verdicts};
use crate::transport::{RemoteTransport, Transport};
use crate::ui::{Spinner, Style};
use crate::verify::{BatchError, BatchSpan, BatchVerifier, Progress, batch_count};

pub struct CheckOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub backend: Option<Backend>,
    pub model: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
}

/// Failures that stop a run before any request is sent.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Input(#[from] LoadError),

    #[error("{0:#}")]
    Config(anyhow::Error),
}

impl CheckError {
    /// Process exit code for this failure (sysexits conventions).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Input(LoadError::Parse { .. }) => exitcode::DATAERR,
            Self::Input(_) => exitcode::NOINPUT,
            Self::Config(_) => exitcode::CONFIG,
        }
    }
}

pub async fn run_check(options: CheckOptions, env: &Environment) -> Result<Summary> {
    let pairs = load_pairs(&options.input).map_err(CheckError::Input)?;
    crate::status!(
        "Loaded {} pairs from {}",
        pairs.len(),
        Style::value(options.input.display())
    );

    let config = load_config(&options, env).map_err(CheckError::Config)?;
    let transport = RemoteTransport::from_config(&config)
        .await
        .map_err(CheckError::Config)?;
    crate::status!(
        "Using {}: {}",
        transport.label(),
        Style::value(transport.model())
    );

    let batches = batch_count(pairs.len(), config.batch_size);
    if batches == 0 {
        crate::status!("{}", Style::hint("No pairs to check"));
    } else {
        crate::status!(
            "Checking in {batches} batch(es) of up to {}",
            config.batch_size
        );
    }

    let verifier = BatchVerifier::new(&transport, config.batch_size);
    let mut progress = TerminalProgress::default();
    let verdicts = verifier.verify(&pairs, &mut progress).await;

    write_verdicts(&config.output, &verdicts)?;

    let summary = Summary::tally(&verdicts);
    println!();
    println!("{}", summary.render(&config.output));

    Ok(summary)
}

fn load_config(options: &CheckOptions, env: &Environment) -> Result<ResolvedConfig> {
    let manager = ConfigManager::new(env)?;
    let file_config = manager.load_or_default()?;

    let resolve_options = ResolveOptions {
        backend: options.backend,
        model: options.model.clone(),
        region: options.region.clone(),
        profile: options.profile.clone(),
        output: options.output.clone(),
        batch_size: options.batch_size,
    };

    resolve_config(&resolve_options, env, &file_config)
}

/// Progress lines on stderr plus a spinner while each request is in flight.
#[derive(Default)]
struct TerminalProgress {
    spinner: Option<Spinner>,
}

impl Progress for TerminalProgress {
    fn batch_started(&mut self, span: &BatchSpan) {
        crate::status!(
            "Checking {}-{} / {} (batch {}/{})",
            span.start + 1,
            span.end,
            span.total,
            span.number,
            span.count
        );

        if !output::is_quiet() {
            self.spinner = Some(Spinner::new(format!(
                "Waiting for batch {}/{}",
                span.number, span.count
            )));
        }
    }

    fn batch_failed(&mut self, span: &BatchSpan, error: &BatchError) {
        self.spinner.take();
        crate::warn!(
            "{} batch {} ({}-{}) failed: {error}",
            Style::error("Error:"),
            span.number,
            span.start + 1,
            span.end
        );
    }

    fn batch_finished(&mut self, _span: &BatchSpan) {
        self.spinner.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exit_codes() {
        let missing = CheckError::Input(LoadError::NotFound(PathBuf::from("x.csv")));
        assert_eq!(missing.exit_code(), exitcode::NOINPUT);

        let unreadable = CheckError::Input(LoadError::Read {
            path: PathBuf::from("x.csv"),
            source: io::Error::other("denied"),
        });
        assert_eq!(unreadable.exit_code(), exitcode::NOINPUT);

        let config = CheckError::Config(anyhow::anyhow!("no key"));
        assert_eq!(config.exit_code(), exitcode::CONFIG);
        assert_eq!(config.to_string(), "no key");
    }
}
