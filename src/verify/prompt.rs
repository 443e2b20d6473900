use anyhow::{Context, Result};

use crate::record::Pair;

pub const PROMPT_TEMPLATE: &str = r#"Check whether each of the following kanji and hiragana reading pairs is correct.

Input data:
{pairs}

Answer with a JSON array containing one object per input item, in the same order:
[
  {"index": 0, "kanji": "漢字", "hiragana": "かんじ", "correct": true, "correct_reading": "かんじ", "note": ""},
  {"index": 1, "kanji": "今日", "hiragana": "きょう", "correct": true, "correct_reading": "きょう", "note": ""},
  {"index": 2, "kanji": "明日", "hiragana": "あした", "correct": true, "correct_reading": "あした/みょうにち", "note": "multiple readings"}
]

Rules:
- index: position of the item in the input data, starting at 0
- correct: whether the given hiragana is a correct reading of the kanji (true/false)
- correct_reading: the correct reading (separate multiple readings with /)
- note: remarks such as multiple readings or context-dependent readings

Output only the JSON array."#;

/// Builds the instruction prompt for one batch.
#[allow(clippy::literal_string_with_formatting_args)]
pub fn build_prompt(pairs: &[Pair]) -> Result<String> {
    // {pairs} is a placeholder for string replacement, not a format argument
    let pairs_json =
        serde_json::to_string_pretty(pairs).context("Failed to serialize batch to JSON")?;
    Ok(PROMPT_TEMPLATE.replace("{pairs}", &pairs_json))
}
