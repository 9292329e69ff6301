//! Terminal progress rendering for mosaic runs.
//!
//! Bridges the engine's [`ProgressCallback`] to an indicatif bar on
//! stderr. The bar length is learned from the first painting snapshot,
//! since only the engine knows the total row count. The callback also
//! carries the cancellation flag set by the Ctrl+C handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use terramosaic::progress::{MosaicPhase, MosaicProgress, ProgressCallback};

/// Progress bar template, sized to leave room for source names.
const BAR_TEMPLATE: &str = "{msg:<28!} [{bar:40}] {percent:>3}%";

/// Owns the progress bar for one mosaic run.
pub struct ProgressReporter {
    bar: ProgressBar,
    cancelled: Arc<AtomicBool>,
}

impl ProgressReporter {
    /// Creates a reporter; `quiet` hides the bar entirely.
    ///
    /// The cancellation flag is shared with the signal handler; once it
    /// turns true, every subsequent callback poll requests a stop.
    pub fn new(quiet: bool, cancelled: Arc<AtomicBool>) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar, cancelled }
    }

    /// Builds the callback handed to the engine.
    pub fn callback(&self) -> ProgressCallback {
        let bar = self.bar.clone();
        let cancelled = Arc::clone(&self.cancelled);
        Arc::new(move |progress: &MosaicProgress| {
            match progress.phase {
                MosaicPhase::Reconciling => {
                    bar.set_message(progress.phase.description().to_string());
                }
                MosaicPhase::Painting => {
                    if bar.length() != Some(progress.rows_total) {
                        bar.set_length(progress.rows_total);
                    }
                    if let Some(source) = &progress.current_source {
                        bar.set_message(source.clone());
                    }
                    bar.set_position(progress.rows_painted);
                }
                MosaicPhase::Complete => {
                    bar.set_length(progress.rows_total.max(1));
                    bar.set_position(progress.rows_total.max(1));
                }
            }
            !cancelled.load(Ordering::SeqCst)
        })
    }

    /// Removes the bar from the terminal, whether the run succeeded or not.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
