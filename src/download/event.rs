//! Normalized progress events.

use super::job::JobId;

/// What a job is doing when an event is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Bytes are being transferred.
    Downloading,
    /// The transfer is done and post-processing has started.
    Converting,
    /// The job failed with the given detail.
    Error(String),
}

/// A progress update produced by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// The job this event belongs to.
    pub job: JobId,
    /// Current status.
    pub status: ProgressStatus,
    /// Bytes transferred so far.
    pub bytes_done: u64,
    /// Expected size in bytes, 0 when unknown.
    pub bytes_total: u64,
    /// File being written, or the URL when no file is known yet.
    pub filename: String,
}

impl ProgressEvent {
    /// Completion percentage, or `None` when the total size is unknown.
    pub fn percent(&self) -> Option<f64> {
        if self.bytes_total == 0 {
            return None;
        }
        Some(self.bytes_done as f64 / self.bytes_total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(done: u64, total: u64) -> ProgressEvent {
        ProgressEvent {
            job: 0,
            status: ProgressStatus::Downloading,
            bytes_done: done,
            bytes_total: total,
            filename: "song.webm".into(),
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(event(50, 200).percent(), Some(25.0));
        assert_eq!(event(200, 200).percent(), Some(100.0));
    }

    #[test]
    fn test_percent_unknown_total() {
        assert_eq!(event(50, 0).percent(), None);
        assert_eq!(event(0, 0).percent(), None);
    }
}
