//! Extraction of the verdict array from the model's free-text reply.
//!
//! Parsing happens in two stages: [`extract_payload`] locates an optional
//! fenced code block, then [`parse_reply`] decodes the payload and checks
//! it against the verdict schema.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Ways a reply can fail to yield one verdict per batch item.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply contains no decodable JSON: {0}")]
    NoStructure(serde_json::Error),

    #[error("reply JSON does not match the verdict schema: {0}")]
    SchemaMismatch(serde_json::Error),

    #[error("reply has {actual} items for a batch of {expected}")]
    CountMismatch { expected: usize, actual: usize },
}

/// One element of the reply array.
///
/// The echoed `index` is not read; replies are matched to the batch by
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplyItem {
    pub kanji: Option<String>,
    pub hiragana: Option<String>,
    pub correct: Option<bool>,
    pub correct_reading: Option<String>,
    pub note: Option<String>,
}

/// Returns the text inside the first fenced code block, or the whole text.
///
/// A `` ```json `` fence wins over a bare fence. For a bare fence, a single
/// word on the opening line (e.g. `JSON`, `javascript`) is treated as an info
/// string and skipped. An unterminated fence runs to the end of the text.
pub fn extract_payload(text: &str) -> &str {
    let body = if let Some((_, rest)) = text.split_once(JSON_FENCE) {
        Some(rest)
    } else if let Some((_, rest)) = text.split_once(FENCE) {
        Some(skip_info_string(rest))
    } else {
        None
    };

    let payload = body.map_or(text, |rest| {
        rest.split_once(FENCE).map_or(rest, |(inner, _)| inner)
    });

    payload.trim()
}

/// Decodes a reply into exactly `expected` items.
pub fn parse_reply(text: &str, expected: usize) -> Result<Vec<ReplyItem>, ReplyError> {
    let payload = extract_payload(text);
    debug!(
        reply_len = text.len(),
        payload_len = payload.len(),
        "Extracted reply payload"
    );

    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(ReplyError::NoStructure)?;
    let items: Vec<ReplyItem> =
        serde_json::from_value(value).map_err(ReplyError::SchemaMismatch)?;

    if items.len() != expected {
        return Err(ReplyError::CountMismatch {
            expected,
            actual: items.len(),
        });
    }

    Ok(items)
}

fn skip_info_string(rest: &str) -> &str {
    match rest.split_once('\n') {
        Some((tag, body)) if is_info_string(tag) => body,
        _ => rest,
    }
}

fn is_info_string(tag: &str) -> bool {
    let tag = tag.trim();
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
