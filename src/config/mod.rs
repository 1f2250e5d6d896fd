//! Persistent application settings.
//!
//! The settings record is a small JSON object. Three keys are recognized
//! and validated; every other key is kept verbatim and handed to the
//! pipeline as a passthrough option.
//!
//! ```json
//! {
//!     "max_dl_threads": 4,
//!     "output_template": "{title}.{ext}",
//!     "savepath": "/home/me/Music"
//! }
//! ```

pub mod store;

pub use store::ConfigStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::path::PathBuf;
use std::thread;

/// Key holding the save directory.
pub const SAVEPATH_KEY: &str = "savepath";
/// Key holding the output naming template.
pub const OUTPUT_TEMPLATE_KEY: &str = "output_template";
/// Key holding the concurrency ceiling.
pub const MAX_DL_THREADS_KEY: &str = "max_dl_threads";

/// Output template used when the configuration does not provide one.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "{title}.{ext}";

/// The validated settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Directory the converted files are written to.
    #[serde(rename = "savepath")]
    pub save_directory: PathBuf,
    /// File name pattern, relative to `save_directory`.
    pub output_template: String,
    /// Maximum number of jobs running at once. Always at least 1.
    #[serde(rename = "max_dl_threads")]
    pub max_concurrent_downloads: usize,
    /// Unrecognized keys, passed through to the pipeline untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            save_directory: default_save_directory(),
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            extra: Map::new(),
        }
    }
}

/// The directory holding the running executable, falling back to the
/// current directory when it cannot be determined.
pub fn default_save_directory() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The host's available parallelism, or 1 if it cannot be queried.
pub fn default_max_concurrent_downloads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
