//! The fixed per-batch pipeline configuration.

use crate::config::Configuration;

use serde_json::{Map, Value};
use std::path::PathBuf;

/// Format selector: best audio-only stream, else the best combined one.
pub const FORMAT_BEST_AUDIO: &str = "bestaudio/best";
/// Codec the audio track is converted to.
pub const AUDIO_CODEC: &str = "mp3";
/// Quality passed to the audio converter, in kbit/s.
pub const AUDIO_QUALITY: &str = "192";

/// A post-processing step run after the transfer completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Extract the audio track and convert it.
    ExtractAudio {
        /// Target codec, e.g. `mp3`.
        codec: String,
        /// Target quality, e.g. `192`.
        quality: String,
    },
    /// Embed the downloaded thumbnail as cover art.
    EmbedThumbnail,
    /// Write title/artist metadata into the file.
    EmbedMetadata,
}

/// Options every job of a batch is processed with.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Format selector.
    pub format: String,
    /// Download the thumbnail next to the media file.
    pub write_thumbnail: bool,
    /// Post-processing steps, in order.
    pub postprocessors: Vec<PostProcessor>,
    /// Process single videos only, even when the URL names a playlist.
    pub no_playlist: bool,
    /// Directory the output template is resolved against.
    pub save_directory: PathBuf,
    /// File name pattern using `{field}` placeholders.
    pub output_template: String,
    /// Passthrough settings from the configuration file.
    pub extra: Map<String, Value>,
}

impl PipelineOptions {
    /// Builds the options for the current configuration.
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            format: FORMAT_BEST_AUDIO.to_string(),
            write_thumbnail: true,
            postprocessors: vec![
                PostProcessor::ExtractAudio {
                    codec: AUDIO_CODEC.to_string(),
                    quality: AUDIO_QUALITY.to_string(),
                },
                PostProcessor::EmbedThumbnail,
                PostProcessor::EmbedMetadata,
            ],
            no_playlist: true,
            save_directory: config.save_directory.clone(),
            output_template: config.output_template.clone(),
            extra: config.extra.clone(),
        }
    }

    /// Full output path pattern, directory and file name joined.
    pub fn output_path(&self) -> PathBuf {
        self.save_directory.join(&self.output_template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = Configuration {
            save_directory: PathBuf::from("/music"),
            output_template: "{artist} - {title}.{ext}".into(),
            max_concurrent_downloads: 2,
            extra: Map::new(),
        };
        config.extra.insert("ratelimit".into(), Value::from("1M"));

        let options = PipelineOptions::from_config(&config);

        assert_eq!(options.format, "bestaudio/best");
        assert!(options.write_thumbnail);
        assert!(options.no_playlist);
        assert_eq!(
            options.postprocessors[0],
            PostProcessor::ExtractAudio {
                codec: "mp3".into(),
                quality: "192".into()
            }
        );
        assert!(options.postprocessors.contains(&PostProcessor::EmbedThumbnail));
        assert_eq!(options.output_path(), PathBuf::from("/music/{artist} - {title}.{ext}"));
        assert_eq!(options.extra.get("ratelimit"), Some(&Value::from("1M")));
    }
}
