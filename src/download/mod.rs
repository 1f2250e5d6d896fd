//! The data a batch is made of.
//!
//! - [`job`] - A single URL and its lifecycle state
//! - [`batch`] - The ordered set of jobs accepted for one submission
//! - [`event`] - Normalized progress events streamed by workers
//!
//! # Examples
//!
//! ```rust
//! use tapedeck::download::{Batch, JobState};
//!
//! let batch = Batch::from_lines("https://example.com/a\n\n  https://example.com/b  \n".lines());
//! assert_eq!(batch.len(), 2);
//! assert!(batch.jobs().iter().all(|job| job.state() == &JobState::Pending));
//! ```

pub mod batch;
pub mod event;
pub mod job;

pub use batch::Batch;
pub use event::{ProgressEvent, ProgressStatus};
pub use job::{DownloadJob, JobId, JobState};
