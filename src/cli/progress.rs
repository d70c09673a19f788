//! Progress feedback for long-running commands
//!
//! Spinners draw only on an interactive stderr; machine and quiet modes and
//! redirected output get a hidden bar so callers never branch on mode.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress output mode based on terminal capabilities and user preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Tty,
    Hidden,
}

impl ProgressMode {
    #[must_use]
    pub fn detect(machine: bool, quiet: bool) -> Self {
        if quiet || machine || !std::io::stderr().is_terminal() {
            Self::Hidden
        } else {
            Self::Tty
        }
    }
}

/// Spinner for an operation of unknown length.
#[must_use]
pub fn spinner(mode: ProgressMode, message: &str) -> ProgressBar {
    if mode == ProgressMode::Hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
