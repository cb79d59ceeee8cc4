//! Spinners shown while collections are drained

use followlist_core::FetchProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a collection drain; hidden when output is machine-readable
pub struct FetchSpinner {
    bar: ProgressBar,
    what: String,
}

impl FetchSpinner {
    /// Start a spinner labelled with `what` ("follows", "list members", ...)
    pub fn start(what: &str, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(format!("Fetching {what}..."));
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            what: what.to_string(),
        }
    }

    /// Progress callback for [`followlist_core::fetch_all_with_progress`]
    pub fn update(&self, progress: FetchProgress) {
        self.bar.set_message(format!(
            "Fetching {}... {} so far ({} pages)",
            self.what, progress.items, progress.pages
        ));
    }

    /// Remove the spinner
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
