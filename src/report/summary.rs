use std::fmt::Write;
use std::path::Path;

use crate::record::Verdict;
use crate::ui::Style;

/// Verdict counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub correct: usize,
    pub incorrect: usize,
    pub errors: usize,
}

impl Summary {
    pub fn tally(verdicts: &[Verdict]) -> Self {
        verdicts
            .iter()
            .fold(Self::default(), |mut summary, verdict| {
                match verdict.correct {
                    Some(true) => summary.correct += 1,
                    Some(false) => summary.incorrect += 1,
                    None => summary.errors += 1,
                }
                summary
            })
    }

    pub const fn total(&self) -> usize {
        self.correct + self.incorrect + self.errors
    }

    /// Formats the end-of-run report.
    pub fn render(&self, output: &Path) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "{}", Style::header("=== Results ==="));
        let _ = writeln!(
            text,
            "{}   {}",
            Style::label("Correct:"),
            Style::success(self.correct)
        );
        let _ = writeln!(
            text,
            "{} {}",
            Style::label("Incorrect:"),
            Style::warning(self.incorrect)
        );
        let _ = writeln!(
            text,
            "{}    {}",
            Style::label("Errors:"),
            Style::error(self.errors)
        );
        let _ = write!(
            text,
            "{}    {}",
            Style::label("Output:"),
            Style::value(output.display())
        );
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Pair;

    fn verdict(correct: Option<bool>) -> Verdict {
        Verdict {
            index: 0,
            kanji: String::new(),
            hiragana: String::new(),
            correct,
            correct_reading: String::new(),
            note: String::new(),
        }
    }

    #[test]
    fn test_tally() {
        let verdicts = vec![
            verdict(Some(true)),
            verdict(Some(true)),
            verdict(Some(false)),
            Verdict::failed(3, &Pair::new("a", "b"), "boom"),
        ];

        let summary = Summary::tally(&verdicts);
        assert_eq!(
            summary,
            Summary {
                correct: 2,
                incorrect: 1,
                errors: 1
            }
        );
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_tally_empty() {
        assert_eq!(Summary::tally(&[]), Summary::default());
    }

    fn strip_ansi(text: &str) -> String {
        let mut plain = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                plain.push(c);
            }
        }
        plain
    }

    #[test]
    fn test_render_lists_counts_and_output() {
        let summary = Summary {
            correct: 2,
            incorrect: 0,
            errors: 0,
        };

        let text = strip_ansi(&summary.render(Path::new("results.csv")));
        assert!(text.contains("Correct:   2"));
        assert!(text.contains("Incorrect: 0"));
        assert!(text.contains("Errors:    0"));
        assert!(text.contains("results.csv"));
    }
}
