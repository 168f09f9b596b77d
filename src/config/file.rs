//! TOML configuration file loading
//!
//! Supports `~/.config/vision-voice/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VisionConfigFile {
    /// Recognition thresholds and timers
    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    /// Wake phrase configuration
    #[serde(default)]
    pub wake_word: WakeWordFileConfig,

    /// Spoken feedback configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,
}

/// Recognition thresholds and timers
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionFileConfig {
    pub wake_threshold: Option<f64>,
    pub command_threshold: Option<f64>,
    pub confidence_floor: Option<f32>,
    pub fallback_confidence: Option<f32>,
    pub duplicate_window: Option<usize>,
    pub history_capacity: Option<usize>,
    pub backoff_base_ms: Option<u64>,
    pub backoff_cap_ms: Option<u64>,
    pub max_errors: Option<u32>,
    pub restart_delay_ms: Option<u64>,
    pub inactivity_prompt_ms: Option<u64>,
    pub cooldown_ms: Option<u64>,
    pub adaptive_learning: Option<bool>,
}

/// Wake phrase configuration
#[derive(Debug, Default, Deserialize)]
pub struct WakeWordFileConfig {
    /// Primary wake phrase (e.g. "hey vision")
    pub phrase: Option<String>,

    /// Literal variants accepted in place of the phrase
    pub variants: Option<Vec<String>>,

    /// Phonetic spellings of common misrecognitions
    pub phonetic_variants: Option<Vec<String>>,

    /// Short aliases (e.g. "vision")
    pub aliases: Option<Vec<String>>,
}

/// Spoken feedback configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Window in which an identical utterance is not repeated
    pub repeat_window_ms: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `VisionConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> VisionConfigFile {
    config_file_path().map_or_else(VisionConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing or malformed files fall back to defaults with a warning.
#[must_use]
pub fn load_from(path: &Path) -> VisionConfigFile {
    if !path.exists() {
        return VisionConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                VisionConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            VisionConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/vision-voice/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("vision-voice").join("config.toml"))
}
