//! Configuration structures and callback types for the dispatcher.
//!
//! ```rust
//! use tapedeck::dispatcher::JobCallback;
//! use tapedeck::download::JobState;
//!
//! let callback: JobCallback = Box::new(|job| match job.state() {
//!     JobState::Finished => println!("✓ {}", job.url()),
//!     JobState::Failed => println!("✗ {}: {}", job.url(), job.error().unwrap_or_default()),
//!     _ => {}
//! });
//! ```

use crate::config::default_max_concurrent_downloads;
use crate::download::DownloadJob;

use std::fmt;
use std::sync::Arc;

/// Callback for when a batch becomes active, with its job count.
pub type BatchStartedCallback = Box<dyn Fn(usize) + Send + Sync>;

/// Callback for when a batch is back to idle, with its terminal jobs.
pub type BatchFinishedCallback = Box<dyn Fn(&[DownloadJob]) + Send + Sync>;

/// Callback for when a single job reaches a terminal state.
pub type JobCallback = Box<dyn Fn(&DownloadJob) + Send + Sync>;

/// Configuration structure for the dispatcher.
#[derive(Clone)]
pub struct DispatcherConfig {
    /// Maximum number of concurrently running jobs. Always at least 1.
    pub concurrent_downloads: usize,
    /// Called once per non-empty batch, before the first job is admitted.
    pub on_batch_started: Option<Arc<BatchStartedCallback>>,
    /// Called once per non-empty batch, after the batch is idle again.
    pub on_batch_finished: Option<Arc<BatchFinishedCallback>>,
    /// Called for every job as soon as it finishes or fails.
    pub on_complete: Option<Arc<JobCallback>>,
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("concurrent_downloads", &self.concurrent_downloads)
            .field("on_batch_started", &self.on_batch_started.is_some())
            .field("on_batch_finished", &self.on_batch_finished.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrent_downloads: default_max_concurrent_downloads(),
            on_batch_started: None,
            on_batch_finished: None,
            on_complete: None,
        }
    }
}
