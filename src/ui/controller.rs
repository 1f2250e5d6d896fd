//! Handles the events a front end forwards.

use super::{Form, FormLog};
use crate::config::{ConfigStore, Configuration};
use crate::dispatcher::{Dispatcher, DispatcherBuilder};
use crate::download::DownloadJob;
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineOptions};

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the settings and the dispatcher on behalf of a [`Form`].
pub struct Controller {
    store: ConfigStore,
    config: Mutex<Configuration>,
    dispatcher: Dispatcher,
    form: Arc<dyn Form>,
}

impl Controller {
    /// Wires `form` to a dispatcher built from `config`.
    ///
    /// The form receives every report line and is switched between its
    /// active and idle views as batches start and finish.
    pub fn new(
        store: ConfigStore,
        config: Configuration,
        pipeline: Arc<dyn Pipeline>,
        form: Arc<dyn Form>,
    ) -> Self {
        let started = form.clone();
        let finished = form.clone();
        let done = form.clone();
        let dispatcher = DispatcherBuilder::from_config(pipeline, &config)
            .sink(Arc::new(FormLog(form.clone())))
            .on_batch_started(move |_| started.show_batch_active())
            .on_batch_finished(move |_| finished.show_batch_idle())
            .on_complete(move |job| done.show_job_done(job))
            .build();

        Self {
            store,
            config: Mutex::new(config),
            dispatcher,
            form,
        }
    }

    /// Gets the dispatcher processing submissions.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns a copy of the current settings.
    pub fn config(&self) -> Configuration {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The user edited the save directory. Persisted immediately; takes
    /// effect with the next submission.
    pub fn on_save_path_changed(&self, path: impl Into<PathBuf>) -> Result<()> {
        let mut config = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.set_save_path(&mut config, path)
    }

    /// The user pressed the download button.
    ///
    /// Starts the batch on the runtime and returns its handle. Returns
    /// `None` while a batch is active; the submission is ignored. The
    /// dispatcher counts as active as soon as this returns, so a second
    /// call is ignored even before the first batch task has run. Must be
    /// called from within a tokio runtime.
    pub fn on_submit(&self) -> Option<JoinHandle<Result<Vec<DownloadJob>>>> {
        let Some(claim) = self.dispatcher.claim() else {
            warn!("Ignoring submission while a batch is running");
            return None;
        };

        let urls = self.form.urls();
        let options = PipelineOptions::from_config(&self.config());
        let dispatcher = self.dispatcher.clone();
        info!("Submitting {} line(s)", urls.len());

        Some(tokio::spawn(async move {
            dispatcher.submit_claimed(claim, urls, options).await
        }))
    }
}
