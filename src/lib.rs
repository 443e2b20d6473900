//! # kanji-check - Kanji Reading Verification CLI
//!
//! `kanji-check` validates kanji/hiragana reading pairs by sending them in
//! batches to Claude, either through the Anthropic API or AWS Bedrock, and
//! writes the model's verdicts to a CSV file.
//!
//! ## Pipeline
//!
//! 1. Load pairs from a CSV or TSV file (delimiter and header detected)
//! 2. Send them in batches; a failed batch is flagged row by row and the
//!    run continues
//! 3. Write `index,kanji,input_hiragana,correct,correct_reading,note` rows
//!    and print correct/incorrect/error counts
//!
//! ## Quick Start
//!
//! ```bash
//! # Anthropic API
//! ANTHROPIC_API_KEY=... kanji-check words.csv results.csv 100
//!
//! # AWS Bedrock
//! USE_BEDROCK=1 AWS_PROFILE=dev kanji-check words.tsv
//! ```
//!
//! ## Configuration
//!
//! Optional defaults are read from `~/.config/kanji-check/config.toml`:
//!
//! ```toml
//! [check]
//! backend = "bedrock"
//! batch_size = 50
//!
//! [bedrock]
//! region = "us-west-2"
//! profile = "dev"
//! ```

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file management and resolution.
pub mod config;

/// File system utilities.
pub mod fs;

/// Input file loading.
pub mod input;

/// Diagnostic logging setup.
pub mod logging;

/// Global output configuration (quiet mode, colors, stderr/stdout routing).
pub mod output;

/// XDG-style path utilities.
pub mod paths;

/// Pairs and verdicts.
pub mod record;

/// Output file and summary.
pub mod report;

/// Remote model transports (Anthropic API, AWS Bedrock).
pub mod transport;

/// Terminal UI components (spinner, colors).
pub mod ui;

/// Batch verification.
pub mod verify;
