use thiserror::Error;
use tracing::debug;

use super::prompt::build_prompt;
use super::reply::{ReplyError, ReplyItem, parse_reply};
use crate::record::{Pair, Verdict};
use crate::transport::Transport;

/// The slice of the input covered by one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    /// 1-based batch number.
    pub number: usize,
    /// Number of batches in the run.
    pub count: usize,
    /// Global index of the first pair.
    pub start: usize,
    /// Global index one past the last pair.
    pub end: usize,
    /// Number of pairs in the run.
    pub total: usize,
}

impl BatchSpan {
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Why a whole batch was marked as failed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{0:#}")]
    Prompt(anyhow::Error),

    #[error("{0:#}")]
    Transport(anyhow::Error),

    #[error(transparent)]
    Reply(#[from] ReplyError),
}

/// Observer for batch progress.
pub trait Progress {
    fn batch_started(&mut self, _span: &BatchSpan) {}
    fn batch_failed(&mut self, _span: &BatchSpan, _error: &BatchError) {}
    fn batch_finished(&mut self, _span: &BatchSpan) {}
}

/// A [`Progress`] that reports nothing.
pub struct NoProgress;

impl Progress for NoProgress {}

/// Number of batches needed for `total` pairs.
pub const fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size)
}

/// Splits `0..total` into consecutive spans of at most `batch_size`.
pub fn batch_spans(total: usize, batch_size: usize) -> impl Iterator<Item = BatchSpan> {
    let count = batch_count(total, batch_size);
    (0..count).map(move |i| {
        let start = i * batch_size;
        BatchSpan {
            number: i + 1,
            count,
            start,
            end: (start + batch_size).min(total),
            total,
        }
    })
}

/// Sends pairs to a [`Transport`] batch by batch and collects verdicts.
pub struct BatchVerifier<'a, T: Transport> {
    transport: &'a T,
    batch_size: usize,
}

impl<'a, T: Transport> BatchVerifier<'a, T> {
    /// A `batch_size` of zero is treated as one.
    pub fn new(transport: &'a T, batch_size: usize) -> Self {
        Self {
            transport,
            batch_size: batch_size.max(1),
        }
    }

    /// Checks every pair, returning one verdict per pair in input order.
    ///
    /// A failed batch does not stop the run; its pairs get placeholder
    /// verdicts with `correct = None` and the error in `note`.
    pub async fn verify(&self, pairs: &[Pair], progress: &mut impl Progress) -> Vec<Verdict> {
        let mut verdicts = Vec::with_capacity(pairs.len());

        for span in batch_spans(pairs.len(), self.batch_size) {
            let batch = &pairs[span.start..span.end];
            progress.batch_started(&span);

            match self.verify_batch(span.start, batch).await {
                Ok(batch_verdicts) => {
                    verdicts.extend(batch_verdicts);
                    progress.batch_finished(&span);
                }
                Err(err) => {
                    progress.batch_failed(&span, &err);
                    let message = err.to_string();
                    verdicts.extend(
                        batch
                            .iter()
                            .enumerate()
                            .map(|(offset, pair)| Verdict::failed(span.start + offset, pair, &message)),
                    );
                }
            }
        }

        verdicts
    }

    /// Checks one batch whose first pair has global index `start`.
    pub async fn verify_batch(
        &self,
        start: usize,
        batch: &[Pair],
    ) -> Result<Vec<Verdict>, BatchError> {
        let prompt = build_prompt(batch).map_err(BatchError::Prompt)?;
        let text = self
            .transport
            .complete(&prompt)
            .await
            .map_err(BatchError::Transport)?;
        let items = parse_reply(&text, batch.len())?;

        Ok(batch
            .iter()
            .zip(items)
            .enumerate()
            .map(|(offset, (pair, item))| merge(start + offset, pair, item))
            .collect())
    }
}

fn merge(index: usize, pair: &Pair, item: ReplyItem) -> Verdict {
    if !echoes_input(&item, pair) {
        debug!(
            index,
            input_kanji = %pair.kanji,
            input_hiragana = %pair.hiragana,
            reply_kanji = item.kanji.as_deref().unwrap_or_default(),
            reply_hiragana = item.hiragana.as_deref().unwrap_or_default(),
            "Reply item echoes a different pair"
        );
    }

    Verdict {
        index,
        kanji: pair.kanji.clone(),
        hiragana: pair.hiragana.clone(),
        correct: item.correct,
        correct_reading: item.correct_reading.unwrap_or_default(),
        note: item.note.unwrap_or_default(),
    }
}

/// Whether the pair echoed in a reply item, where present, is the input pair.
///
/// Mismatches are only logged: the verdict always carries the input pair.
fn echoes_input(item: &ReplyItem, pair: &Pair) -> bool {
    item.kanji.as_ref().is_none_or(|kanji| *kanji == pair.kanji)
        && item
            .hiragana
            .as_ref()
            .is_none_or(|hiragana| *hiragana == pair.hiragana)
}
