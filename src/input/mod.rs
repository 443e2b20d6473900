//! Reading kanji/reading pairs from delimited text files.

mod loader;

pub use loader::{HEADER_ALIASES, LoadError, detect_delimiter, load_pairs, parse_pairs};
