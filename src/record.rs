//! Input pairs and the verdicts produced for them.

use serde::Serialize;

/// One kanji/reading record from the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    pub kanji: String,
    pub hiragana: String,
}

impl Pair {
    pub fn new(kanji: impl Into<String>, hiragana: impl Into<String>) -> Self {
        Self {
            kanji: kanji.into(),
            hiragana: hiragana.into(),
        }
    }
}

/// The outcome of checking one [`Pair`].
///
/// `index` is the pair's position in the input file. `correct` is `None`
/// when the batch containing the pair could not be checked; `note` then
/// holds the error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub index: usize,
    pub kanji: String,
    pub hiragana: String,
    pub correct: Option<bool>,
    pub correct_reading: String,
    pub note: String,
}

impl Verdict {
    /// Builds the placeholder recorded for a pair whose batch failed.
    pub fn failed(index: usize, pair: &Pair, message: &str) -> Self {
        Self {
            index,
            kanji: pair.kanji.clone(),
            hiragana: pair.hiragana.clone(),
            correct: None,
            correct_reading: String::new(),
            note: format!("ERROR: {message}"),
        }
    }

    pub const fn is_error(&self) -> bool {
        self.correct.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_verdict_carries_error_note() {
        let pair = Pair::new("漢字", "かんじ");
        let verdict = Verdict::failed(7, &pair, "connection refused");

        assert_eq!(verdict.index, 7);
        assert_eq!(verdict.kanji, "漢字");
        assert_eq!(verdict.hiragana, "かんじ");
        assert!(verdict.is_error());
        assert!(verdict.correct_reading.is_empty());
        assert_eq!(verdict.note, "ERROR: connection refused");
    }

    #[test]
    fn test_pair_serializes_as_prompt_object() {
        let pair = Pair::new("今日", "きょう");
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"kanji":"今日","hiragana":"きょう"}"#);
    }
}
