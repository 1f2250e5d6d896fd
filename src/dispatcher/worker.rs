//! Runs the pipeline for a single job.
//!
//! The worker is the isolation boundary of a batch. Whatever the pipeline
//! reports is translated into [`ProgressEvent`]s, and whatever it fails
//! with is turned into an [`Outcome::Failed`] plus an error event. Nothing
//! escapes as an `Err`.

use crate::download::{JobId, ProgressEvent, ProgressStatus};
use crate::error::Error;
use crate::pipeline::{Pipeline, PipelineOptions, RawProgress, RawStatus};

use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Detail used when the pipeline's hook reports an error without one.
const HOOK_ERROR_DETAIL: &str = "the transfer reported an error";

/// Terminal result of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The pipeline completed.
    Finished,
    /// The pipeline failed with a message.
    Failed(String),
}

/// Callback receiving normalized events.
pub type EventSink<'a> = &'a (dyn Fn(ProgressEvent) + Send + Sync);

/// Wraps one pipeline invocation.
#[derive(Clone)]
pub struct Worker {
    pipeline: Arc<dyn Pipeline>,
}

impl Worker {
    /// Creates a worker using `pipeline`.
    pub fn new(pipeline: Arc<dyn Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Processes `url` as job `job`, streaming events to `sink`.
    pub async fn run(
        &self,
        job: JobId,
        url: &str,
        options: &PipelineOptions,
        sink: EventSink<'_>,
    ) -> Outcome {
        if let Err(e) = Url::parse(url) {
            let message = Error::InvalidUrl(e.to_string()).to_string();
            warn!("Job {} rejected {:?}: {}", job, url, message);
            sink(error_event(job, url, &message));
            return Outcome::Failed(message);
        }

        debug!("Job {} handing {:?} to {}", job, url, self.pipeline.name());
        let forward = |raw: RawProgress| {
            if let Some(event) = normalize(job, url, raw) {
                sink(event);
            }
        };

        match self.pipeline.fetch(url, options, &forward).await {
            Ok(()) => {
                debug!("Job {} finished {:?}", job, url);
                Outcome::Finished
            }
            Err(e) => {
                let message = failure_message(e);
                warn!("\"{}\" failed with error: {}", url, message);
                sink(error_event(job, url, &message));
                Outcome::Failed(message)
            }
        }
    }
}

/// Translates a raw hook report. Reports with an unknown status are dropped.
pub fn normalize(job: JobId, url: &str, raw: RawProgress) -> Option<ProgressEvent> {
    let status = match raw.status? {
        RawStatus::Downloading => ProgressStatus::Downloading,
        RawStatus::Finished => ProgressStatus::Converting,
        RawStatus::Error => ProgressStatus::Error(HOOK_ERROR_DETAIL.to_string()),
    };

    Some(ProgressEvent {
        job,
        status,
        bytes_done: raw.downloaded_bytes.unwrap_or(0),
        bytes_total: raw.total_bytes.or(raw.total_bytes_estimate).unwrap_or(0),
        filename: raw.filename.unwrap_or_else(|| url.to_string()),
    })
}

pub(crate) fn error_event(job: JobId, url: &str, message: &str) -> ProgressEvent {
    ProgressEvent {
        job,
        status: ProgressStatus::Error(message.to_string()),
        bytes_done: 0,
        bytes_total: 0,
        filename: url.to_string(),
    }
}

fn failure_message(error: Error) -> String {
    match error {
        Error::Pipeline(message) => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: RawStatus) -> RawProgress {
        RawProgress {
            status: Some(status),
            downloaded_bytes: Some(50),
            total_bytes: Some(200),
            total_bytes_estimate: None,
            filename: Some("/music/a.webm".into()),
        }
    }

    #[test]
    fn test_normalize_downloading() {
        let event = normalize(3, "https://e.x/v", raw(RawStatus::Downloading)).unwrap();
        assert_eq!(event.job, 3);
        assert_eq!(event.status, ProgressStatus::Downloading);
        assert_eq!(event.bytes_done, 50);
        assert_eq!(event.bytes_total, 200);
        assert_eq!(event.filename, "/music/a.webm");
    }

    #[test]
    fn test_normalize_finished_is_converting() {
        let event = normalize(0, "https://e.x/v", raw(RawStatus::Finished)).unwrap();
        assert_eq!(event.status, ProgressStatus::Converting);
    }

    #[test]
    fn test_normalize_uses_estimate() {
        let mut report = raw(RawStatus::Downloading);
        report.total_bytes = None;
        report.total_bytes_estimate = Some(400);
        assert_eq!(normalize(0, "u", report).unwrap().bytes_total, 400);
    }

    #[test]
    fn test_normalize_missing_fields() {
        let report = RawProgress {
            status: Some(RawStatus::Downloading),
            ..RawProgress::default()
        };
        let event = normalize(0, "https://e.x/v", report).unwrap();
        assert_eq!(event.bytes_done, 0);
        assert_eq!(event.bytes_total, 0);
        assert_eq!(event.filename, "https://e.x/v");
    }

    #[test]
    fn test_normalize_unknown_status() {
        assert!(normalize(0, "u", RawProgress::default()).is_none());
    }

    #[test]
    fn test_failure_message() {
        assert_eq!(failure_message(Error::Pipeline("boom".into())), "boom");
        assert_eq!(failure_message(Error::BatchActive), "A batch is already running");
    }
}
