//! Error handling for the tapedeck library.
//!
//! Errors fall in three groups. Configuration problems are self-healed by
//! the [`ConfigStore`](crate::config::ConfigStore) wherever a default can be
//! computed. Per-job failures are caught by the worker and recorded on the
//! job, so they never reach the dispatcher as an `Err`. What remains is
//! returned to the caller.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen when using tapedeck.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// Captures failures that don't fit into other categories, such as a
    /// closed semaphore.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The configuration could not be read, parsed or written.
    #[error("Configuration error in {path:?}: {message}")]
    Config {
        /// Location of the configuration file.
        path: PathBuf,
        /// Human-readable description of the problem.
        message: String,
    },

    /// A submitted line is not a usable URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The external pipeline failed for a single URL.
    ///
    /// Workers turn this into a failed job; it is only ever returned by
    /// [`Pipeline`](crate::pipeline::Pipeline) implementations.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// A batch was submitted while another one is still active.
    #[error("A batch is already running")]
    BatchActive,

    /// I/O Error.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the JSON serializer.
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Result type alias for operations that can fail with a tapedeck error.
pub type Result<T> = std::result::Result<T, Error>;
