//! Command spinner with elapsed time display
//!
//! Provides visual feedback while a node is being provisioned, with an
//! animated spinner and elapsed time indicator.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TEMPLATE: &str = "{spinner:.green} {msg} ({elapsed_precise:.dim})";

/// A spinner for remote operations with elapsed time display
///
/// Becomes a no-op in quiet mode.
///
/// # Example
///
/// ```ignore
/// let spinner = CommandSpinner::new_maybe("Applying node main...", quiet);
/// // ... do work ...
/// spinner.success("Applied node main");
/// ```
pub struct CommandSpinner {
    bar: Option<ProgressBar>,
}

impl CommandSpinner {
    /// Create a spinner ticking every 100ms
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("\u{28CB}\u{2819}\u{2839}\u{2838}\u{283C}\u{2834}\u{2826}\u{2827}\u{2807}\u{280F}");
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    /// Create a spinner that respects quiet mode
    pub fn new_maybe(message: &str, quiet: bool) -> Self {
        if quiet {
            Self { bar: None }
        } else {
            Self::new(message)
        }
    }

    /// Finish with a green checkmark and the time taken
    pub fn success(self, message: &str) {
        self.finish(console::style("\u{2713}").green().to_string(), message);
    }

    /// Finish with a red cross and the time taken
    pub fn fail(self, message: &str) {
        self.finish(console::style("\u{2717}").red().to_string(), message);
    }

    fn finish(self, mark: String, message: &str) {
        if let Some(bar) = self.bar {
            let elapsed = humantime::format_duration(Duration::from_secs(bar.elapsed().as_secs()));
            bar.set_style(
                ProgressStyle::with_template("{msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.finish_with_message(format!(
                "{mark} {message} {}",
                console::style(format!("({elapsed})")).dim()
            ));
        }
    }
}
