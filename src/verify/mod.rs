//! Batch verification of pairs against a remote model.

mod batch;
mod prompt;
pub mod reply;

pub use batch::{
    BatchError, BatchSpan, BatchVerifier, NoProgress, Progress, batch_count, batch_spans,
};
pub use prompt::{PROMPT_TEMPLATE, build_prompt};
pub use reply::{ReplyError, ReplyItem, extract_payload, parse_reply};
