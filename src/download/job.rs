//! A single URL's download/convert lifecycle.

use std::fmt;

/// Position of a job within its batch, starting at 0.
pub type JobId = usize;

/// Lifecycle state of a [`DownloadJob`].
///
/// Jobs only ever move forward: `Pending -> Running -> Finished | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Accepted into a batch, waiting for a free slot.
    Pending,
    /// A worker is processing the job.
    Running,
    /// The pipeline completed successfully.
    Finished,
    /// The pipeline failed; see [`DownloadJob::error`].
    Failed,
}

impl JobState {
    /// Returns `true` for `Finished` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Finished => "finished",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One URL accepted into a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    id: JobId,
    url: String,
    state: JobState,
    error: Option<String>,
}

impl DownloadJob {
    /// Creates a pending job.
    pub fn new(id: JobId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            state: JobState::Pending,
            error: None,
        }
    }

    /// Get the job's position within its batch.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Get the submitted URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get a reference to the job's state.
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Get the failure message, if the job failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark the job as assigned to a worker.
    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.state, JobState::Pending);
        self.state = JobState::Running;
    }

    /// Mark the job as successfully completed.
    pub(crate) fn finish(&mut self) {
        self.state = JobState::Finished;
        self.error = None;
    }

    /// Mark the job as failed with a message.
    pub(crate) fn fail(&mut self, msg: impl fmt::Display) {
        self.state = JobState::Failed;
        self.error = Some(msg.to_string());
    }
}
