use console::{style, strip_ansi_codes, StyledObject};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// colour a piece of final-line text by outcome
fn paint<D>(text: D, success: bool) -> StyledObject<D> {
    let styled = style(text);
    if success { styled.green() } else { styled.red() }
}

/// Spinner shown while a login, logout or preference save is in flight.
/// Replaced by a ✓/✕ line once the operation finishes.
pub struct StatusSpinner<'a> {
    multi: &'a MultiProgress,
    bar: ProgressBar,
}

impl<'a> StatusSpinner<'a> {
    pub fn new(loading: &str, multi: &'a MultiProgress) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(TICK);
        bar.set_message(style(loading).yellow().bright().to_string());
        Self { bar, multi }
    }

    pub fn finish(&self, message: &str, success: bool) {
        let finished = ProgressStyle::default_spinner()
            .template("{prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        self.bar.set_style(finished);
        self.bar.set_prefix(paint(if success { "✓" } else { "✕" }, success).bold().to_string());
        self.bar.finish_with_message(paint(message, success).bright().to_string());

        // indicatif draws nothing when stderr is not a terminal
        if self.bar.is_hidden() && !success {
            eprintln!("{}", strip_ansi_codes(message));
        }

        self.multi.remove(&self.bar);
    }
}
