//! [`Pipeline`] implementation driving the `yt-dlp` executable.
//!
//! The child process is asked to print one machine-readable line per
//! progress hook (`--newline --progress-template`). Those lines are parsed
//! back into [`RawProgress`] values; everything else it prints is logged
//! at debug level. On a non-zero exit the last `ERROR:` line of stderr
//! becomes the failure message.

use super::options::{PipelineOptions, PostProcessor};
use super::template;
use super::{Pipeline, ProgressCallback, RawProgress, RawStatus};
use crate::error::{Error, Result};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Marker prefixed to every progress line requested from yt-dlp.
pub const PROGRESS_MARKER: &str = "[tapedeck]";

/// Name of the executable looked up in `PATH`.
pub const BINARY_NAME: &str = "yt-dlp";

/// Runs `yt-dlp` as a child process.
///
/// ```no_run
/// use tapedeck::pipeline::YtDlp;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let pipeline = YtDlp::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let pipeline = YtDlp::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    /// Create a pipeline running the executable at `program`.
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Attempt to find yt-dlp in PATH.
    pub fn from_path() -> Option<Self> {
        which::which(BINARY_NAME).ok().map(Self::new)
    }

    /// Gets the executable this pipeline runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command line arguments for processing `url` with `options`.
    pub fn args(url: &str, options: &PipelineOptions) -> Vec<String> {
        let mut args = vec![
            "--newline".to_string(),
            "--progress-template".to_string(),
            progress_template(),
            "-f".to_string(),
            options.format.clone(),
        ];

        if options.write_thumbnail {
            args.push("--write-thumbnail".into());
        }
        if options.no_playlist {
            args.push("--no-playlist".into());
        }

        for step in &options.postprocessors {
            match step {
                PostProcessor::ExtractAudio { codec, quality } => {
                    args.push("--extract-audio".into());
                    args.push("--audio-format".into());
                    args.push(codec.clone());
                    args.push("--audio-quality".into());
                    args.push(quality.clone());
                }
                PostProcessor::EmbedThumbnail => args.push("--embed-thumbnail".into()),
                PostProcessor::EmbedMetadata => args.push("--embed-metadata".into()),
            }
        }

        args.push("--paths".into());
        args.push(options.save_directory.to_string_lossy().into_owned());
        args.push("--output".into());
        args.push(template::to_native(&options.output_template));

        args.extend(passthrough_args(&options.extra));

        // Keeps a URL starting with '-' from being read as an option.
        args.push("--".into());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl Pipeline for YtDlp {
    async fn fetch(
        &self,
        url: &str,
        options: &PipelineOptions,
        progress: ProgressCallback<'_>,
    ) -> Result<()> {
        let args = Self::args(url, options);
        debug!("Running {:?} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Pipeline(format!("Failed to execute {}: {}", self.program.display(), e))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("child stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Internal("child stderr was not captured".into()))?;

        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut last_error = None;
            let mut last_line = None;
            loop {
                let line = match read_line_lossy(&mut reader, &mut buf).await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read {} stderr: {}", BINARY_NAME, e);
                        break;
                    }
                };
                debug!(target: "tapedeck::yt_dlp", "{}", line);
                if let Some(message) = line.strip_prefix("ERROR: ") {
                    last_error = Some(message.to_string());
                } else if !line.trim().is_empty() {
                    last_line = Some(line);
                }
            }
            last_error.or(last_line)
        });

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        while let Some(line) = read_line_lossy(&mut reader, &mut buf).await? {
            match parse_progress_line(&line) {
                Some(report) => progress(report),
                None => debug!(target: "tapedeck::yt_dlp", "{}", line),
            }
        }

        let status = child.wait().await?;
        let detail = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(Error::Pipeline(
                detail.unwrap_or_else(|| format!("{} exited with {}", BINARY_NAME, status)),
            ))
        }
    }

    fn name(&self) -> &'static str {
        BINARY_NAME
    }
}

/// Reads one line, replacing invalid UTF-8 instead of failing on it.
///
/// Titles and file names are printed in whatever encoding the platform
/// uses, so the output is not guaranteed to be UTF-8.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// The `--progress-template` value. The filename goes last since it may
/// contain spaces.
fn progress_template() -> String {
    format!(
        "download:{} %(progress.status)s %(progress.downloaded_bytes)s \
         %(progress.total_bytes)s %(progress.total_bytes_estimate)s %(progress.filename)s",
        PROGRESS_MARKER
    )
}

/// Parses a line produced by [`progress_template`].
///
/// Returns `None` for lines that are not progress reports. Fields yt-dlp
/// could not fill are printed as `NA` and parse to `None`.
pub fn parse_progress_line(line: &str) -> Option<RawProgress> {
    let body = line.trim_end().strip_prefix(PROGRESS_MARKER)?.trim_start();
    let mut fields = body.splitn(5, ' ');

    let status = match fields.next()? {
        "downloading" => Some(RawStatus::Downloading),
        "finished" => Some(RawStatus::Finished),
        "error" => Some(RawStatus::Error),
        _ => None,
    };
    let downloaded_bytes = fields.next().and_then(parse_bytes);
    let total_bytes = fields.next().and_then(parse_bytes);
    let total_bytes_estimate = fields.next().and_then(parse_bytes);
    let filename = fields
        .next()
        .filter(|name| !name.is_empty() && *name != "NA")
        .map(String::from);

    Some(RawProgress {
        status,
        downloaded_bytes,
        total_bytes,
        total_bytes_estimate,
        filename,
    })
}

/// Byte counts come as integers, or as floats for estimates.
fn parse_bytes(field: &str) -> Option<u64> {
    field.parse::<u64>().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

/// Maps passthrough configuration keys to command line flags.
///
/// `snake_case` keys become `--kebab-case` flags. `true` enables a flag,
/// `false` adds its `--no-` form, scalars become the flag's value, arrays
/// repeat the flag once per element and `null` is skipped.
pub fn passthrough_args(extra: &Map<String, Value>) -> Vec<String> {
    let mut args = Vec::new();

    for (key, value) in extra {
        let name = key.trim_start_matches('-').replace('_', "-");
        if name.is_empty() {
            continue;
        }
        match value {
            Value::Null => {}
            Value::Bool(true) => args.push(format!("--{}", name)),
            Value::Bool(false) => args.push(format!("--no-{}", name)),
            Value::Array(items) => {
                for item in items {
                    match scalar(item) {
                        Some(v) => {
                            args.push(format!("--{}", name));
                            args.push(v);
                        }
                        None => warn!("Ignoring non-scalar element of option {:?}", key),
                    }
                }
            }
            Value::Object(_) => warn!("Ignoring option {:?}: nested objects are not supported", key),
            other => {
                if let Some(v) = scalar(other) {
                    args.push(format!("--{}", name));
                    args.push(v);
                }
            }
        }
    }

    args
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use serde_json::json;

    fn options() -> PipelineOptions {
        PipelineOptions::from_config(&Configuration {
            save_directory: PathBuf::from("/music"),
            output_template: "{title}.{ext}".into(),
            max_concurrent_downloads: 1,
            extra: Map::new(),
        })
    }

    fn position(args: &[String], flag: &str) -> usize {
        args.iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("missing {}", flag))
    }

    #[test]
    fn test_args_contain_fixed_options() {
        let args = YtDlp::args("https://example.com/v", &options());

        assert_eq!(args[position(&args, "-f") + 1], "bestaudio/best");
        assert_eq!(args[position(&args, "--audio-format") + 1], "mp3");
        assert_eq!(args[position(&args, "--audio-quality") + 1], "192");
        assert_eq!(args[position(&args, "--paths") + 1], "/music");
        assert_eq!(args[position(&args, "--output") + 1], "%(title)s.%(ext)s");
        for flag in [
            "--newline",
            "--write-thumbnail",
            "--no-playlist",
            "--extract-audio",
            "--embed-thumbnail",
            "--embed-metadata",
        ] {
            position(&args, flag);
        }
    }

    #[test]
    fn test_url_is_last_after_separator() {
        let args = YtDlp::args("-weird", &options());
        assert_eq!(&args[args.len() - 2..], ["--", "-weird"]);
    }

    #[test]
    fn test_passthrough_args() {
        let extra = match json!({
            "ratelimit": "1M",
            "retries": 5,
            "no_warnings": true,
            "mtime": false,
            "cookies_from_browser": null,
            "match_filter": ["duration < 600", "!is_live"],
            "nested": {"a": 1},
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let args = passthrough_args(&extra);

        assert!(args.windows(2).any(|w| w == ["--ratelimit", "1M"]));
        assert!(args.windows(2).any(|w| w == ["--retries", "5"]));
        assert!(args.contains(&"--no-warnings".to_string()));
        assert!(args.contains(&"--no-mtime".to_string()));
        assert!(!args.iter().any(|a| a.contains("cookies")));
        assert!(!args.iter().any(|a| a.contains("nested")));
        assert_eq!(args.iter().filter(|a| *a == "--match-filter").count(), 2);
    }

    #[test]
    fn test_parse_downloading_line() {
        let line = "[tapedeck] downloading 1024 4096 NA /music/My Song.webm";
        let report = parse_progress_line(line).unwrap();

        assert_eq!(report.status, Some(RawStatus::Downloading));
        assert_eq!(report.downloaded_bytes, Some(1024));
        assert_eq!(report.total_bytes, Some(4096));
        assert_eq!(report.total_bytes_estimate, None);
        assert_eq!(report.filename.as_deref(), Some("/music/My Song.webm"));
    }

    #[test]
    fn test_parse_estimate_as_float() {
        let line = "[tapedeck] downloading 10 NA 20480.5 a.m4a";
        let report = parse_progress_line(line).unwrap();

        assert_eq!(report.total_bytes, None);
        assert_eq!(report.total_bytes_estimate, Some(20480));
    }

    #[test]
    fn test_parse_finished_line() {
        let report = parse_progress_line("[tapedeck] finished 4096 4096 NA a.webm\n").unwrap();
        assert_eq!(report.status, Some(RawStatus::Finished));
    }

    #[test]
    fn test_non_progress_lines() {
        assert!(parse_progress_line("[youtube] abc: Downloading webpage").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn test_unknown_status() {
        let report = parse_progress_line("[tapedeck] paused NA NA NA NA").unwrap();
        assert_eq!(report.status, None);
        assert_eq!(report.filename, None);
    }

    #[tokio::test]
    async fn test_missing_executable_fails() {
        let pipeline = YtDlp::new(PathBuf::from("/nonexistent/tapedeck-yt-dlp"));
        let result = pipeline
            .fetch("https://example.com/v", &options(), &|_| {})
            .await;

        match result {
            Err(Error::Pipeline(msg)) => assert!(msg.contains("Failed to execute")),
            other => panic!("expected a pipeline error, got {:?}", other),
        }
    }
}
