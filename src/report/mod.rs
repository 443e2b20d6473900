//! Output file writing and the end-of-run summary.

mod summary;
mod writer;

pub use summary::Summary;
pub use writer::{OUTPUT_HEADER, render_csv, write_verdicts};
