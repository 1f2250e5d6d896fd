//! Console output for batches.
//!
//! [`ProgressDisplay`] is a [`LogSink`] that prints report lines above a
//! bar counting finished jobs. Lines go through indicatif so they never
//! tear the bar.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tapedeck::progress::{ProgressBarOpts, ProgressDisplay, Reporter};
//!
//! let display = Arc::new(ProgressDisplay::new(ProgressBarOpts::default()));
//! let reporter = Reporter::new().with_sink(display.clone());
//!
//! display.begin(3);
//! reporter.publish_line("Converting \"song.webm\" ...");
//! display.increment_main();
//! display.finish();
//! ```

use super::sink::LogSink;
use super::style::ProgressBarOpts;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use tracing::debug;

/// Progress display manager for one batch at a time.
pub struct ProgressDisplay {
    /// Coordinates the bar with printed lines.
    multi: MultiProgress,
    /// Counts finished jobs of the current batch.
    main: ProgressBar,
    /// Style options for the bar.
    opts: ProgressBarOpts,
}

impl ProgressDisplay {
    /// Create a display drawing to stderr, or nowhere when `opts` is hidden.
    pub fn new(opts: ProgressBarOpts) -> Self {
        let multi = if opts.is_enabled() {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        let main = multi.add(opts.to_progress_bar(0));

        Self { multi, main, opts }
    }

    /// Create a display that draws nothing.
    pub fn hidden() -> Self {
        Self::new(ProgressBarOpts::hidden())
    }

    /// Reset the bar for a batch of `total` jobs.
    pub fn begin(&self, total: usize) {
        self.main.reset();
        self.main.set_length(total as u64);
        self.main.tick();
    }

    /// Advance the bar by one finished job.
    pub fn increment_main(&self) {
        self.main.inc(1);
    }

    /// Finish the bar, clearing or keeping it based on configuration.
    pub fn finish(&self) {
        if self.opts.clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}

impl LogSink for ProgressDisplay {
    fn append_line(&self, line: &str) {
        let styled = if line.starts_with("Error") {
            style(line).red().to_string()
        } else if line.starts_with("Converting") {
            style(line).green().to_string()
        } else {
            line.to_string()
        };

        if self.multi.is_hidden() {
            // A hidden MultiProgress swallows println, so fall back to stdout.
            println!("{}", line);
        } else if let Err(e) = self.multi.println(styled) {
            debug!("Failed to print progress line: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_counts_finished_jobs() {
        let display = ProgressDisplay::hidden();

        display.begin(3);
        display.increment_main();
        display.increment_main();
        assert_eq!(display.main.length(), Some(3));
        assert_eq!(display.main.position(), 2);

        display.begin(1);
        assert_eq!(display.main.position(), 0);
        display.finish();
        assert!(display.main.is_finished());
    }
}
