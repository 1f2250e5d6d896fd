//! Core dispatcher implementation.
//!
//! A [`Dispatcher`] runs one batch at a time. Jobs are admitted strictly in
//! submission order, each one only after a semaphore permit is available,
//! so no more than the configured ceiling ever runs at once. Completions
//! free their permit and the next pending job is admitted right away.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tapedeck::config::{ConfigStore};
//! use tapedeck::dispatcher::DispatcherBuilder;
//! use tapedeck::pipeline::{PipelineOptions, YtDlp};
//!
//! # async fn example() -> tapedeck::Result<()> {
//! let config = ConfigStore::default().load()?;
//! let pipeline = Arc::new(YtDlp::from_path().expect("yt-dlp not found in PATH"));
//! let dispatcher = DispatcherBuilder::from_config(pipeline, &config).build();
//!
//! let jobs = dispatcher
//!     .submit(
//!         ["https://www.youtube.com/watch?v=dQw4w9WgXcQ"],
//!         PipelineOptions::from_config(&config),
//!     )
//!     .await?;
//! for job in jobs {
//!     println!("{}: {}", job.url(), job.state());
//! }
//! # Ok(())
//! # }
//! ```

use super::config::DispatcherConfig;
use super::worker::{error_event, Outcome, Worker};
use crate::download::{Batch, DownloadJob, JobState, ProgressEvent};
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::progress::Reporter;

use futures::future;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Represents the batch controller.
///
/// Cloning is cheap and every clone drives the same state: a batch
/// submitted through one clone makes the others report it as active.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    config: DispatcherConfig,
    pipeline: Arc<dyn Pipeline>,
    reporter: Arc<Reporter>,
    running: AtomicUsize,
    active: AtomicBool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .field("pipeline", &self.inner.pipeline.name())
            .field("running", &self.running())
            .field("active", &self.is_active())
            .finish()
    }
}

impl Dispatcher {
    pub(crate) fn new(
        config: DispatcherConfig,
        pipeline: Arc<dyn Pipeline>,
        reporter: Arc<Reporter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pipeline,
                reporter,
                running: AtomicUsize::new(0),
                active: AtomicBool::new(false),
            }),
        }
    }

    /// Gets the concurrency ceiling.
    pub fn concurrent_downloads(&self) -> usize {
        self.inner.config.concurrent_downloads
    }

    /// Number of jobs currently running.
    pub fn running(&self) -> usize {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Returns `true` while a batch is being processed.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Gets the reporter jobs publish their progress to.
    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.inner.reporter
    }

    /// Marks the dispatcher active without submitting anything yet.
    ///
    /// Returns `None` while another batch is active. The claim is handed
    /// to [`Dispatcher::submit_claimed`]; dropping it unused makes the
    /// dispatcher idle again. Front ends use it to refuse a second click
    /// before the first batch has even been spawned.
    pub fn claim(&self) -> Option<BatchClaim> {
        self.inner
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BatchClaim {
                inner: self.inner.clone(),
            })
    }

    /// Downloads every URL in `urls` with `options`.
    ///
    /// Lines are trimmed and blank ones ignored. An empty submission
    /// returns immediately without any signal. While another batch is
    /// active the submission is rejected with [`Error::BatchActive`].
    ///
    /// Resolves once every job is terminal, returning them in submission
    /// order. Individual failures are recorded on their job and never
    /// turn into an `Err`. The batch runs on its own task: dropping the
    /// returned future does not stop it, and the dispatcher stays active
    /// until its last job is terminal.
    pub async fn submit<I, S>(&self, urls: I, options: PipelineOptions) -> Result<Vec<DownloadJob>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let batch = Batch::from_lines(urls);
        if batch.is_empty() {
            debug!("Ignoring empty submission");
            return Ok(Vec::new());
        }

        let claim = self.claim().ok_or(Error::BatchActive)?;
        self.spawn_batch(claim, batch, options).await
    }

    /// Like [`Dispatcher::submit`], for a batch already claimed with
    /// [`Dispatcher::claim`]. An empty submission releases the claim.
    pub async fn submit_claimed<I, S>(
        &self,
        claim: BatchClaim,
        urls: I,
        options: PipelineOptions,
    ) -> Result<Vec<DownloadJob>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !Arc::ptr_eq(&claim.inner, &self.inner) {
            return Err(Error::Internal(
                "batch claim belongs to another dispatcher".into(),
            ));
        }

        let batch = Batch::from_lines(urls);
        if batch.is_empty() {
            debug!("Ignoring empty submission");
            return Ok(Vec::new());
        }

        self.spawn_batch(claim, batch, options).await
    }

    async fn spawn_batch(
        &self,
        claim: BatchClaim,
        batch: Batch,
        options: PipelineOptions,
    ) -> Result<Vec<DownloadJob>> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.run_batch(claim, batch, options).await })
            .await
            .map_err(|e| Error::Internal(format!("batch task failed: {}", e)))?
    }

    async fn run_batch(
        self,
        claim: BatchClaim,
        mut batch: Batch,
        options: PipelineOptions,
    ) -> Result<Vec<DownloadJob>> {
        let ceiling = self.inner.config.concurrent_downloads;
        info!(
            "Starting batch of {} job(s), at most {} at once",
            batch.len(),
            ceiling
        );
        if let Some(ref callback) = self.inner.config.on_batch_started {
            callback(batch.len());
        }

        let options = Arc::new(options);
        let semaphore = Arc::new(Semaphore::new(ceiling));
        let mut handles = Vec::with_capacity(batch.len());

        for job in batch.jobs_mut() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Internal(format!("admission semaphore closed: {}", e)))?;

            job.start();
            let slot = RunningSlot::take(self.inner.clone());
            info!("Job {} started for: {}", job.id(), job.url());

            let inner = self.inner.clone();
            let options = options.clone();
            let mut job = job.clone();
            handles.push(tokio::spawn(async move {
                let reporter = inner.reporter.clone();
                let sink = move |event: ProgressEvent| reporter.publish(&event);
                let worker = Worker::new(inner.pipeline.clone());

                let outcome = worker.run(job.id(), job.url(), &options, &sink).await;
                match outcome {
                    Outcome::Finished => job.finish(),
                    Outcome::Failed(message) => job.fail(message),
                }

                drop(slot);
                drop(permit);
                debug!("Job {} is {}", job.id(), job.state());
                if let Some(ref callback) = inner.config.on_complete {
                    callback(&job);
                }
                job
            }));
        }

        let results = future::join_all(handles).await;
        for (job, result) in batch.jobs_mut().iter_mut().zip(results) {
            match result {
                Ok(done) => *job = done,
                Err(e) => {
                    warn!("Worker for job {} did not complete: {}", job.id(), e);
                    let message = format!("worker task failed: {}", e);
                    self.inner
                        .reporter
                        .publish(&error_event(job.id(), job.url(), &message));
                    job.fail(message);
                    if let Some(ref callback) = self.inner.config.on_complete {
                        callback(job);
                    }
                }
            }
        }

        drop(claim);

        let failed = batch
            .jobs()
            .iter()
            .filter(|job| job.state() == &JobState::Failed)
            .count();
        info!(
            "Batch finished: {} succeeded, {} failed",
            batch.len() - failed,
            failed
        );
        if let Some(ref callback) = self.inner.config.on_batch_finished {
            callback(batch.jobs());
        }

        Ok(batch.into_jobs())
    }
}

/// Keeps the dispatcher active for as long as it is alive.
///
/// Obtained from [`Dispatcher::claim`].
pub struct BatchClaim {
    inner: Arc<Inner>,
}

impl fmt::Debug for BatchClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchClaim").finish_non_exhaustive()
    }
}

impl Drop for BatchClaim {
    fn drop(&mut self) {
        self.inner.active.store(false, Ordering::SeqCst);
    }
}

/// Counts one running job. Released before the admission permit, so the
/// counter never exceeds the ceiling.
struct RunningSlot {
    inner: Arc<Inner>,
}

impl RunningSlot {
    fn take(inner: Arc<Inner>) -> Self {
        inner.running.fetch_add(1, Ordering::SeqCst);
        Self { inner }
    }
}

impl Drop for RunningSlot {
    fn drop(&mut self) {
        self.inner.running.fetch_sub(1, Ordering::SeqCst);
    }
}
