use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::record::Pair;

/// First-cell values that mark a header row (compared lower-cased).
pub const HEADER_ALIASES: &[&str] = &["kanji", "漢字", "word"];

/// Errors raised while loading the input file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read file: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse file: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Loads every usable pair from a comma- or tab-delimited file, in file order.
pub fn load_pairs(path: &Path) -> Result<Vec<Pair>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_pairs(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses delimited text into pairs.
///
/// The delimiter is chosen from the first line only. A row on the first line
/// whose first cell is a known header alias is skipped. Rows with fewer than
/// two cells are dropped.
pub fn parse_pairs(text: &str) -> Result<Vec<Pair>, csv::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = detect_delimiter(text);
    debug!(delimiter = %(delimiter as char).escape_default(), "Detected input delimiter");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    // Blank lines are skipped by the reader, so the first record is on the
    // first line only when the text does not open with a line break.
    let first_row_on_first_line = !text.starts_with(['\n', '\r']);

    let mut pairs = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;

        if row == 0 && first_row_on_first_line && is_header(&record) {
            debug!(header = ?record, "Skipping header row");
            continue;
        }

        if let (Some(kanji), Some(hiragana)) = (record.get(0), record.get(1)) {
            pairs.push(Pair::new(kanji.trim(), hiragana.trim()));
        }
    }

    Ok(pairs)
}

/// Returns `b'\t'` if the first line contains a tab, otherwise `b','`.
pub fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.contains('\t') { b'\t' } else { b',' }
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.get(0).is_some_and(|cell| {
        let cell = cell.trim().to_lowercase();
        HEADER_ALIASES.contains(&cell.as_str())
    })
}
