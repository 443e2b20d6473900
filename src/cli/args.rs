use clap::Parser;
use std::path::PathBuf;

use crate::config::Backend;

const AFTER_HELP: &str = "\
Input file format (CSV or TSV, optional header row):
  漢字,かんじ
  今日,きょう
  明日,あした

Environment:
  USE_BEDROCK=1        Use AWS Bedrock instead of the Anthropic API
  ANTHROPIC_API_KEY    API key for the Anthropic API
  AWS_PROFILE          AWS profile for Bedrock
  AWS_REGION           AWS region for Bedrock (default: us-west-2)

Examples:
  kanji-check words.csv results.csv 100
  USE_BEDROCK=1 AWS_PROFILE=dev kanji-check words.tsv";

#[derive(Parser, Debug)]
#[command(name = "kanji-check")]
#[command(about = "Verify kanji/hiragana reading pairs with Claude")]
#[command(version)]
#[command(after_help = AFTER_HELP)]
pub struct Args {
    /// Input file with kanji,hiragana pairs (CSV or TSV)
    pub input: PathBuf,

    /// Output CSV file [default: kanji_check_results.csv]
    pub output: Option<PathBuf>,

    /// Number of pairs sent per request [default: 100]
    #[arg(value_parser = parse_batch_size)]
    pub batch_size: Option<usize>,

    /// Remote backend (overrides USE_BEDROCK)
    #[arg(short = 'b', long, value_enum)]
    pub backend: Option<Backend>,

    /// Model identifier
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// AWS region for Bedrock
    #[arg(long)]
    pub region: Option<String>,

    /// AWS profile for Bedrock
    #[arg(long)]
    pub profile: Option<String>,

    /// Suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(_) => Err(format!("'{value}' is not a positive integer")),
    }
}
