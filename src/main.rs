use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tapedeck::config::store::DEFAULT_CONFIG_FILE;
use tapedeck::progress::{ProgressBarOpts, ProgressDisplay};
use tapedeck::{Batch, ConfigStore, Controller, DownloadJob, Form, JobState, LogSink, YtDlp};

#[derive(Parser)]
#[command(name = "tapedeck", version, about = "Download videos as mp3 files")]
struct Args {
    /// URLs to download. Read from stdin, one per line, when omitted.
    urls: Vec<String>,

    /// Directory to save the converted files to. Stored in the configuration.
    #[arg(short, long)]
    save_path: Option<PathBuf>,

    /// Configuration file.
    #[arg(short, long, env = "TAPEDECK_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Path to the yt-dlp executable. Looked up in PATH when omitted.
    #[arg(long, env = "TAPEDECK_YT_DLP")]
    yt_dlp: Option<PathBuf>,

    /// Print progress lines only, without the batch progress bar.
    #[arg(long)]
    no_progress: bool,
}

/// The terminal front end: a fixed list of URLs and a console log.
struct TerminalForm {
    urls: Vec<String>,
    save_path: PathBuf,
    display: ProgressDisplay,
}

impl Form for TerminalForm {
    fn urls(&self) -> Vec<String> {
        self.urls.clone()
    }

    fn save_path(&self) -> PathBuf {
        self.save_path.clone()
    }

    fn show_batch_active(&self) {
        self.display.begin(Batch::from_lines(&self.urls).len());
    }

    fn show_batch_idle(&self) {
        self.display.finish();
    }

    fn append_log_line(&self, text: &str) {
        self.display.append_line(text);
    }

    fn show_job_done(&self, _job: &DownloadJob) {
        self.display.increment_main();
    }
}

fn read_urls_from_stdin() -> Result<Vec<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter the URL(s) to download, one per line, then press Ctrl-D:");
    }
    let lines = stdin.lock().lines().collect::<io::Result<Vec<_>>>()?;
    Ok(lines)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let store = ConfigStore::new(&args.config);
    let config = store.load()?;

    let pipeline = match args.yt_dlp {
        Some(path) => YtDlp::new(path),
        None => YtDlp::from_path()
            .ok_or_else(|| eyre!("yt-dlp was not found in PATH, install it or pass --yt-dlp"))?,
    };

    let urls = if args.urls.is_empty() {
        read_urls_from_stdin()?
    } else {
        args.urls
    };

    let opts = if args.no_progress {
        ProgressBarOpts::hidden()
    } else {
        ProgressBarOpts::default()
    };
    let form = Arc::new(TerminalForm {
        urls,
        save_path: args
            .save_path
            .unwrap_or_else(|| config.save_directory.clone()),
        display: ProgressDisplay::new(opts),
    });

    let controller = Controller::new(store, config, Arc::new(pipeline), form.clone());
    if form.save_path() != controller.config().save_directory {
        controller.on_save_path_changed(form.save_path())?;
    }

    let Some(batch) = controller.on_submit() else {
        return Ok(ExitCode::SUCCESS);
    };
    let jobs = batch.await??;

    let failed: Vec<_> = jobs
        .iter()
        .filter(|job| job.state() == &JobState::Failed)
        .collect();
    for job in &failed {
        eprintln!(
            "\"{}\" failed with error: {}",
            job.url(),
            job.error().unwrap_or("unknown error")
        );
    }

    if failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
