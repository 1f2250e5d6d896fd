//! Builder pattern implementation for creating Dispatcher instances.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tapedeck::dispatcher::DispatcherBuilder;
//! use tapedeck::download::JobState;
//! use tapedeck::pipeline::YtDlp;
//!
//! let pipeline = Arc::new(YtDlp::from_path().expect("yt-dlp not found in PATH"));
//! let dispatcher = DispatcherBuilder::new(pipeline)
//!     .concurrent_downloads(4)
//!     .on_batch_started(|jobs| println!("Starting {} download(s)", jobs))
//!     .on_complete(|job| {
//!         if job.state() == &JobState::Failed {
//!             println!("[Failed] {}", job.url());
//!         }
//!     })
//!     .build();
//! ```

use super::{config::DispatcherConfig, dispatcher::Dispatcher};
use crate::config::Configuration;
use crate::download::DownloadJob;
use crate::pipeline::Pipeline;
use crate::progress::{LogSink, Reporter};

use std::sync::Arc;
use tokio::sync::Semaphore;

/// A builder used to create a [`Dispatcher`].
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    pipeline: Arc<dyn Pipeline>,
    reporter: Reporter,
}

impl DispatcherBuilder {
    /// Creates a builder with the default options around `pipeline`.
    pub fn new(pipeline: Arc<dyn Pipeline>) -> Self {
        Self {
            config: DispatcherConfig::default(),
            pipeline,
            reporter: Reporter::new(),
        }
    }

    /// Creates a builder taking its ceiling from the settings record.
    pub fn from_config(pipeline: Arc<dyn Pipeline>, config: &Configuration) -> Self {
        Self::new(pipeline).concurrent_downloads(config.max_concurrent_downloads)
    }

    /// Set the number of concurrent downloads.
    ///
    /// A value of 0 is raised to 1.
    pub fn concurrent_downloads(mut self, concurrent_downloads: usize) -> Self {
        self.config.concurrent_downloads = concurrent_downloads.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    /// Register a sink receiving every report line.
    pub fn sink(self, sink: Arc<dyn LogSink>) -> Self {
        self.reporter.add_sink(sink);
        self
    }

    /// Set callback for when a batch becomes active.
    ///
    /// Receives the number of jobs in the batch. Empty submissions never
    /// trigger it.
    pub fn on_batch_started<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.config.on_batch_started = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Set callback for when a batch is idle again.
    ///
    /// The dispatcher already accepts a new submission when it runs.
    pub fn on_batch_finished<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[DownloadJob]) + Send + Sync + 'static,
    {
        self.config.on_batch_finished = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Set callback for when each job completes.
    ///
    /// The callback will be called immediately when each job finishes or
    /// fails, regardless of whether other jobs are still running.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DownloadJob) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Create the [`Dispatcher`] with the specified options.
    pub fn build(self) -> Dispatcher {
        Dispatcher::new(self.config, self.pipeline, Arc::new(self.reporter))
    }
}
