//! Loading, validating and persisting the settings file.
//!
//! The store never treats a broken settings file as fatal. A missing or
//! unparsable file is regenerated from defaults, and individual keys with
//! unusable values are replaced by computed defaults. Every correction is
//! written back immediately so the file on disk always matches what the
//! application runs with.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tapedeck::config::ConfigStore;
//!
//! # fn example() -> tapedeck::Result<()> {
//! let store = ConfigStore::new("config.json");
//! let mut config = store.load()?;
//! store.set_save_path(&mut config, "/home/me/Music")?;
//! # Ok(())
//! # }
//! ```

use super::{
    default_max_concurrent_downloads, default_save_directory, Configuration,
    DEFAULT_OUTPUT_TEMPLATE, MAX_DL_THREADS_KEY, OUTPUT_TEMPLATE_KEY, SAVEPATH_KEY,
};
use crate::error::{Error, Result};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default settings file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Reads and writes the settings record at a fixed location.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl ConfigStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Gets the location of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings, creating or repairing the file as needed.
    pub fn load(&self) -> Result<Configuration> {
        let raw = match self.read_raw()? {
            Some(raw) => raw,
            None => {
                info!("Writing default configuration to {:?}", self.path);
                self.persist(&Configuration::default())?;
                self.read_raw()?.ok_or_else(|| Error::Config {
                    path: self.path.clone(),
                    message: "freshly written defaults could not be read back".into(),
                })?
            }
        };

        self.validate_and_fix(raw)
    }

    /// Replaces every missing or unusable recognized key with its default.
    ///
    /// The corrected record is persisted when anything had to change. An
    /// already valid record is left alone and nothing is written.
    pub fn validate_and_fix(&self, mut raw: Map<String, Value>) -> Result<Configuration> {
        let mut fixed = Vec::new();

        let savepath_ok = matches!(raw.get(SAVEPATH_KEY), Some(Value::String(s)) if !s.is_empty());
        if !savepath_ok {
            let default = default_save_directory().to_string_lossy().into_owned();
            raw.insert(SAVEPATH_KEY.into(), Value::String(default));
            fixed.push(SAVEPATH_KEY);
        }

        let threads_ok = raw
            .get(MAX_DL_THREADS_KEY)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .is_some_and(|n| n >= 1);
        if !threads_ok {
            raw.insert(
                MAX_DL_THREADS_KEY.into(),
                Value::from(default_max_concurrent_downloads()),
            );
            fixed.push(MAX_DL_THREADS_KEY);
        }

        let template_ok =
            matches!(raw.get(OUTPUT_TEMPLATE_KEY), Some(Value::String(s)) if !s.is_empty());
        if !template_ok {
            raw.insert(OUTPUT_TEMPLATE_KEY.into(), Value::from(DEFAULT_OUTPUT_TEMPLATE));
            fixed.push(OUTPUT_TEMPLATE_KEY);
        }

        let config: Configuration = serde_json::from_value(Value::Object(raw))?;

        if fixed.is_empty() {
            debug!("Configuration in {:?} is valid", self.path);
        } else {
            warn!("Replaced invalid configuration keys with defaults: {:?}", fixed);
            self.persist(&config)?;
        }

        Ok(config)
    }

    /// Writes the full record with sorted keys and four-space indentation.
    pub fn persist(&self, config: &Configuration) -> Result<()> {
        let value = serde_json::to_value(config)?;
        let sorted: BTreeMap<String, Value> = match value {
            Value::Object(map) => map.into_iter().collect(),
            other => {
                return Err(Error::Internal(format!(
                    "configuration serialized to a non-object: {}",
                    other
                )))
            }
        };

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        sorted.serialize(&mut serializer)?;
        buf.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, buf)?;
        debug!("Persisted configuration to {:?}", self.path);
        Ok(())
    }

    /// Updates the save directory and persists the record immediately.
    pub fn set_save_path(&self, config: &mut Configuration, path: impl Into<PathBuf>) -> Result<()> {
        config.save_directory = path.into();
        info!("Save directory set to {:?}", config.save_directory);
        self.persist(config)
    }

    /// Reads the raw record. `None` means the file has to be regenerated.
    fn read_raw(&self) -> Result<Option<Map<String, Value>>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => {
                warn!("{:?} does not hold a JSON object, regenerating it", self.path);
                Ok(None)
            }
            Err(e) => {
                warn!("{:?} is not valid JSON ({}), regenerating it", self.path, e);
                Ok(None)
            }
        }
    }
}
