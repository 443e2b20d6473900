use anyhow::{Context, Result, anyhow};
use std::path::Path;

use crate::fs::atomic_write;
use crate::record::Verdict;

pub const OUTPUT_HEADER: [&str; 6] = [
    "index",
    "kanji",
    "input_hiragana",
    "correct",
    "correct_reading",
    "note",
];

/// Renders verdicts as CSV, header first.
///
/// `correct` is written as `true`, `false`, or an empty cell for failed rows.
pub fn render_csv(verdicts: &[Verdict]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(OUTPUT_HEADER)
        .context("Failed to write CSV header")?;

    for verdict in verdicts {
        let index = verdict.index.to_string();
        writer
            .write_record([
                index.as_str(),
                verdict.kanji.as_str(),
                verdict.hiragana.as_str(),
                correct_cell(verdict.correct),
                verdict.correct_reading.as_str(),
                verdict.note.as_str(),
            ])
            .with_context(|| format!("Failed to write CSV row {index}"))?;
    }

    writer
        .into_inner()
        .map_err(|err| anyhow!("Failed to flush CSV output: {}", err.error()))
}

/// Writes verdicts to `path`, replacing any existing file.
pub fn write_verdicts(path: &Path, verdicts: &[Verdict]) -> Result<()> {
    let content = render_csv(verdicts)?;
    atomic_write(path, &content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

const fn correct_cell(correct: Option<bool>) -> &'static str {
    match correct {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    }
}
