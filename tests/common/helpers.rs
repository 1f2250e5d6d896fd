#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use tapedeck::pipeline::{Pipeline, PipelineOptions, ProgressCallback, RawProgress, RawStatus};
use tapedeck::{ConfigStore, Configuration, Error, Result};

// Common test constants
pub const TEST_DOMAIN: &str = "https://media.example.com";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a store backed by `config.json` inside `dir`
pub fn create_test_store(dir: &Path) -> ConfigStore {
    ConfigStore::new(dir.join("config.json"))
}

/// A valid configuration saving to `dir`
pub fn create_test_config(dir: &Path, max_concurrent_downloads: usize) -> Configuration {
    Configuration {
        save_directory: dir.to_path_buf(),
        output_template: "{title}.{ext}".into(),
        max_concurrent_downloads,
        extra: Default::default(),
    }
}

/// Pipeline options saving under `/music`
pub fn create_test_options() -> PipelineOptions {
    PipelineOptions::from_config(&create_test_config(&PathBuf::from("/music"), 1))
}

/// A URL the scripted pipeline completes after `ms` milliseconds
pub fn ok_url(name: &str, ms: u64) -> String {
    format!("{}/ok/{}?ms={}", TEST_DOMAIN, name, ms)
}

/// A URL the scripted pipeline fails after `ms` milliseconds
pub fn fail_url(name: &str, ms: u64) -> String {
    format!("{}/fail/{}?ms={}", TEST_DOMAIN, name, ms)
}

/// A URL the scripted pipeline holds until [`ScriptedPipeline::release`]
pub fn gated_url(name: &str) -> String {
    format!("{}/gate/{}", TEST_DOMAIN, name)
}

/// A URL the scripted pipeline panics on
pub fn panic_url(name: &str) -> String {
    format!("{}/panic/{}", TEST_DOMAIN, name)
}

/// Pipeline whose behavior is scripted by the URL path.
///
/// - `/ok/<name>?ms=N` reports progress, sleeps N ms and succeeds
/// - `/fail/<name>?ms=N` sleeps N ms and fails
/// - `/gate/<name>` reports progress and waits for a released permit
/// - `/panic/<name>` panics
///
/// It records the order fetches started in and how many overlapped.
pub struct ScriptedPipeline {
    started: Mutex<Vec<String>>,
    current: AtomicUsize,
    peak: AtomicUsize,
    gate: Semaphore,
    save_directories: Mutex<Vec<PathBuf>>,
}

impl ScriptedPipeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Mutex::new(Vec::new()),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            save_directories: Mutex::new(Vec::new()),
        })
    }

    /// URLs in the order their fetch started
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Number of fetches started so far
    pub fn started_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    /// Highest number of overlapping fetches observed
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Save directory of every fetch, in start order
    pub fn save_directories(&self) -> Vec<PathBuf> {
        self.save_directories.lock().unwrap().clone()
    }

    /// Lets `n` gated fetches complete
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Waits until at least `n` fetches have started
    pub async fn wait_for_started(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.started_count() < n {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("timed out waiting for fetches to start");
    }
}

fn delay_ms(url: &str) -> u64 {
    url.split("ms=")
        .nth(1)
        .and_then(|ms| ms.parse().ok())
        .unwrap_or(0)
}

fn file_name(url: &str) -> String {
    let name = url
        .rsplit('/')
        .next()
        .unwrap_or("media")
        .split('?')
        .next()
        .unwrap_or("media");
    format!("/music/{}.webm", name)
}

fn report(status: RawStatus, done: u64, total: u64, url: &str) -> RawProgress {
    RawProgress {
        status: Some(status),
        downloaded_bytes: Some(done),
        total_bytes: Some(total),
        total_bytes_estimate: None,
        filename: Some(file_name(url)),
    }
}

/// Decrements the overlap counter even if the fetch panics.
struct Overlap<'a>(&'a AtomicUsize);

impl Drop for Overlap<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Pipeline for ScriptedPipeline {
    async fn fetch(
        &self,
        url: &str,
        options: &PipelineOptions,
        progress: ProgressCallback<'_>,
    ) -> Result<()> {
        self.started.lock().unwrap().push(url.to_string());
        self.save_directories
            .lock()
            .unwrap()
            .push(options.save_directory.clone());
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _overlap = Overlap(&self.current);

        if url.contains("/panic/") {
            panic!("scripted panic for {}", url);
        }

        progress(report(RawStatus::Downloading, 50, 200, url));

        if url.contains("/gate/") {
            self.gate
                .acquire()
                .await
                .expect("gate closed")
                .forget();
        } else {
            tokio::time::sleep(Duration::from_millis(delay_ms(url))).await;
        }

        if url.contains("/fail/") {
            return Err(Error::Pipeline(format!("scripted failure for {}", url)));
        }

        progress(report(RawStatus::Downloading, 200, 200, url));
        progress(report(RawStatus::Finished, 200, 200, url));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Counts how often each dispatcher callback fired.
#[derive(Default)]
pub struct CallbackCounter {
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    pub completed: AtomicUsize,
    pub started_with: AtomicUsize,
}

impl CallbackCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Writes an executable shell script standing in for yt-dlp.
///
/// The script ignores its arguments and runs `body`.
#[cfg(unix)]
pub fn create_fake_yt_dlp(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path
}
