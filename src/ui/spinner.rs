use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::output;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);

/// Spinner on stderr while a batch request is in flight.
///
/// indicatif hides it when stderr is not a terminal. It clears itself on drop.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(spinner_style());
        bar.set_message(message.into());
        bar.enable_steady_tick(TICK);
        Self { bar }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn spinner_style() -> ProgressStyle {
    let template = if output::is_no_color() {
        "{spinner} {msg} {elapsed}"
    } else {
        "{spinner:.cyan} {msg} {elapsed:.dim}"
    };
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(FRAMES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_style_builds() {
        let _ = spinner_style();
    }

    #[test]
    fn test_spinner_drops_cleanly() {
        let spinner = Spinner::new("Waiting for batch 1/1");
        drop(spinner);
    }
}
