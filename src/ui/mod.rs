//! Glue between a form-style front end and the dispatcher.
//!
//! tapedeck does not draw widgets. A front end implements [`Form`] (a
//! URL text area, a save directory entry, a log area and a way to switch
//! between the "ready" and "downloading" views), and forwards its user
//! events to a [`Controller`].

pub mod controller;

pub use controller::Controller;

use crate::download::DownloadJob;
use crate::progress::LogSink;

use std::path::PathBuf;
use std::sync::Arc;

/// The UI collaborator.
pub trait Form: Send + Sync {
    /// The URLs currently entered, one per line.
    fn urls(&self) -> Vec<String>;

    /// The save directory currently entered.
    fn save_path(&self) -> PathBuf;

    /// Switch to the view shown while a batch runs.
    fn show_batch_active(&self);

    /// Switch back to the view accepting a new submission.
    fn show_batch_idle(&self);

    /// Append a line to the log area.
    fn append_log_line(&self, text: &str);

    /// A job reached a terminal state.
    fn show_job_done(&self, _job: &DownloadJob) {}
}

/// Routes report lines into a form's log area.
pub(crate) struct FormLog(pub(crate) Arc<dyn Form>);

impl LogSink for FormLog {
    fn append_line(&self, line: &str) {
        self.0.append_log_line(line);
    }
}
