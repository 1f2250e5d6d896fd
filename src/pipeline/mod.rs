//! The external fetch/extract/convert capability.
//!
//! A [`Pipeline`] downloads one URL, converts it and writes the result
//! under the configured output template. tapedeck never implements this
//! itself; [`YtDlp`] drives the `yt-dlp` executable, and tests plug in
//! scripted fakes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tapedeck::config::Configuration;
//! use tapedeck::pipeline::{Pipeline, PipelineOptions, RawProgress, YtDlp};
//!
//! # async fn example() -> tapedeck::Result<()> {
//! let pipeline = YtDlp::from_path().expect("yt-dlp not found in PATH");
//! let options = PipelineOptions::from_config(&Configuration::default());
//! pipeline
//!     .fetch("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &options, &|p: RawProgress| println!("{:?}", p))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod options;
pub mod template;
pub mod yt_dlp;

pub use options::{PipelineOptions, PostProcessor};
pub use yt_dlp::YtDlp;

use crate::error::Result;
use async_trait::async_trait;

/// Status reported by the pipeline's progress hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    /// Transfer in progress.
    Downloading,
    /// Transfer complete, post-processing follows.
    Finished,
    /// The transfer failed.
    Error,
}

/// A progress callback as emitted by the pipeline, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProgress {
    /// Hook status, `None` when the pipeline reported something unknown.
    pub status: Option<RawStatus>,
    /// Bytes transferred so far.
    pub downloaded_bytes: Option<u64>,
    /// Exact size, when the server announced one.
    pub total_bytes: Option<u64>,
    /// Estimated size, for fragmented or chunked transfers.
    pub total_bytes_estimate: Option<u64>,
    /// Destination file of the transfer.
    pub filename: Option<String>,
}

/// Callback receiving raw progress reports.
pub type ProgressCallback<'a> = &'a (dyn Fn(RawProgress) + Send + Sync);

/// Fetches, extracts and converts a single URL.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Processes `url` with `options`, reporting every progress hook to
    /// `progress` before returning.
    ///
    /// Returns [`Error::Pipeline`](crate::Error::Pipeline) (or an I/O error)
    /// when the URL could not be processed.
    async fn fetch(
        &self,
        url: &str,
        options: &PipelineOptions,
        progress: ProgressCallback<'_>,
    ) -> Result<()>;

    /// Short name used in log messages.
    fn name(&self) -> &'static str;
}
