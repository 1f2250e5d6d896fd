//! Bounded-concurrency batch dispatching.
//!
//! - `dispatcher` - The [`Dispatcher`] running one batch at a time
//! - `builder` - [`DispatcherBuilder`] for configuring ceiling, sinks and callbacks
//! - `config` - Configuration structure and callback types
//! - `worker` - The per-job isolation boundary around the pipeline
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tapedeck::config::Configuration;
//! use tapedeck::dispatcher::DispatcherBuilder;
//! use tapedeck::pipeline::{PipelineOptions, YtDlp};
//! use tapedeck::progress::ProgressDisplay;
//!
//! # async fn example() -> tapedeck::Result<()> {
//! let display = Arc::new(ProgressDisplay::hidden());
//! let dispatcher = DispatcherBuilder::new(Arc::new(YtDlp::new("yt-dlp".into())))
//!     .concurrent_downloads(2)
//!     .sink(display)
//!     .on_batch_finished(|jobs| println!("{} job(s) done", jobs.len()))
//!     .build();
//!
//! let urls = "https://example.com/a\nhttps://example.com/b\nhttps://example.com/c";
//! dispatcher
//!     .submit(urls.lines(), PipelineOptions::from_config(&Configuration::default()))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
#[allow(clippy::module_inception)]
pub mod dispatcher;
pub mod worker;

pub use builder::DispatcherBuilder;
pub use config::{BatchFinishedCallback, BatchStartedCallback, DispatcherConfig, JobCallback};
pub use dispatcher::{BatchClaim, Dispatcher};
pub use worker::{Outcome, Worker};
