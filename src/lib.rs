//! tapedeck downloads batches of video URLs as tagged audio files.
//!
//! The heavy lifting (extraction, transfer, transcoding) is done by an
//! external [`Pipeline`], by default the `yt-dlp` executable. tapedeck
//! contributes the coordination around it: at most a configured number of
//! downloads run at once, jobs are admitted in submission order, a failing
//! URL never affects its siblings, and progress is streamed as readable
//! lines to any number of sinks.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tapedeck::{ConfigStore, DispatcherBuilder, PipelineOptions, YtDlp, Error};
//! use tapedeck::progress::ProgressDisplay;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let config = ConfigStore::default().load()?;
//! let pipeline = Arc::new(YtDlp::from_path().expect("yt-dlp not found in PATH"));
//! let dispatcher = DispatcherBuilder::from_config(pipeline, &config)
//!     .sink(Arc::new(ProgressDisplay::hidden()))
//!     .build();
//!
//! let urls = vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ"];
//! dispatcher.submit(urls, PipelineOptions::from_config(&config)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`config`] - The persisted settings record and its store
//! - [`download`] - Jobs, batches and progress events
//! - [`pipeline`] - The external fetch/convert seam and its yt-dlp implementation
//! - [`dispatcher`] - The bounded-concurrency batch dispatcher and its workers
//! - [`progress`] - Report line formatting and sinks
//! - [`ui`] - Glue for form-style front ends
//! - [`error`] - Centralized error handling with the `Error` enum

pub mod config;
pub mod dispatcher;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod ui;

pub use config::{ConfigStore, Configuration};
pub use dispatcher::{BatchClaim, Dispatcher, DispatcherBuilder, Outcome, Worker};
pub use download::{Batch, DownloadJob, JobId, JobState, ProgressEvent, ProgressStatus};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineOptions, RawProgress, RawStatus, YtDlp};
pub use progress::{format_event, LogSink, MemorySink, Reporter};
pub use ui::{Controller, Form};
