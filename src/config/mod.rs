//! Configuration management for the voice command pipeline

pub mod file;

use std::time::Duration;

use serde::Serialize;

use crate::matching::normalize;
use crate::{Error, Result};

/// Default wake phrase
pub const DEFAULT_WAKE_PHRASE: &str = "hey vision";

/// Voice pipeline configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    /// Recognition thresholds and timers
    pub recognition: RecognitionConfig,

    /// Wake phrase configuration
    pub wake_word: WakeWordConfig,

    /// Spoken feedback configuration
    pub speech: SpeechConfig,
}

/// Recognition thresholds and timers
///
/// The thresholds are empirically chosen defaults, not derived optima.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionConfig {
    /// Wake phrase confidence required to activate (exclusive)
    pub wake_threshold: f64,

    /// Command match confidence required to dispatch (exclusive)
    pub command_threshold: f64,

    /// Final results at or below this engine confidence are ignored
    pub confidence_floor: f32,

    /// Confidence assumed when the engine reports none
    pub fallback_confidence: f32,

    /// Number of recent transcripts checked for duplicates
    pub duplicate_window: usize,

    /// Capacity of the transcript history
    pub history_capacity: usize,

    /// Base delay for restart backoff
    pub backoff_base_ms: u64,

    /// Maximum restart backoff delay
    pub backoff_cap_ms: u64,

    /// Consecutive transient errors tolerated before halting
    pub max_errors: u32,

    /// Delay before restarting after a normal end of recognition
    pub restart_delay_ms: u64,

    /// Interval of the "still listening" prompt
    pub inactivity_prompt_ms: u64,

    /// Cool-down after a dispatch before the next command is accepted
    pub cooldown_ms: u64,

    /// Scale command confidence by past success rate
    pub adaptive_learning: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            wake_threshold: 0.65,
            command_threshold: 0.7,
            confidence_floor: 0.35,
            fallback_confidence: 0.8,
            duplicate_window: 3,
            history_capacity: 10,
            backoff_base_ms: 1000,
            backoff_cap_ms: 10_000,
            max_errors: 5,
            restart_delay_ms: 300,
            inactivity_prompt_ms: 60_000,
            cooldown_ms: 2000,
            adaptive_learning: true,
        }
    }
}

impl RecognitionConfig {
    /// Delay before restarting after a normal end
    #[must_use]
    pub const fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Inactivity prompt interval
    #[must_use]
    pub const fn inactivity_prompt(&self) -> Duration {
        Duration::from_millis(self.inactivity_prompt_ms)
    }

    /// Dispatch cool-down
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Check thresholds and capacities
    ///
    /// # Errors
    ///
    /// Returns error if a threshold is outside [0, 1] or a window is empty
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("wake_threshold", self.wake_threshold),
            ("command_threshold", self.command_threshold),
            ("confidence_floor", f64::from(self.confidence_floor)),
            ("fallback_confidence", f64::from(self.fallback_confidence)),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be within [0, 1], got {value}")));
            }
        }

        if self.history_capacity == 0 {
            return Err(Error::Config("history_capacity must be positive".to_string()));
        }
        if self.duplicate_window > self.history_capacity {
            return Err(Error::Config(format!(
                "duplicate_window ({}) exceeds history_capacity ({})",
                self.duplicate_window, self.history_capacity
            )));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(Error::Config("backoff_cap_ms is below backoff_base_ms".to_string()));
        }
        if self.inactivity_prompt_ms == 0 {
            return Err(Error::Config("inactivity_prompt_ms must be positive".to_string()));
        }

        Ok(())
    }
}

/// Wake phrase configuration
#[derive(Debug, Clone, Serialize)]
pub struct WakeWordConfig {
    /// Primary wake phrase
    pub phrase: String,

    /// Literal variants accepted in place of the phrase
    pub variants: Vec<String>,

    /// Phonetic spellings of common misrecognitions
    pub phonetic_variants: Vec<String>,

    /// Short aliases
    pub aliases: Vec<String>,
}

impl Default for WakeWordConfig {
    fn default() -> Self {
        Self {
            phrase: DEFAULT_WAKE_PHRASE.to_string(),
            variants: to_strings(&[
                "hey vision",
                "hi vision",
                "hay vision",
                "okay vision",
                "hey visions",
            ]),
            phonetic_variants: to_strings(&["hey vishun", "hey vizhun", "hey visin", "hey fision"]),
            aliases: to_strings(&["vision"]),
        }
    }
}

impl WakeWordConfig {
    /// Configuration for a custom phrase with no extra variants
    #[must_use]
    pub fn for_phrase(phrase: &str) -> Self {
        let phrase = phrase.trim().to_lowercase();
        if phrase == DEFAULT_WAKE_PHRASE {
            return Self::default();
        }

        Self {
            variants: vec![phrase.clone()],
            phrase,
            phonetic_variants: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Check that the phrase survives normalization
    ///
    /// # Errors
    ///
    /// Returns error if the phrase is empty after normalization, since it
    /// could never be detected
    pub fn validate(&self) -> Result<()> {
        if normalize(&self.phrase).is_empty() {
            return Err(Error::Config(format!(
                "wake phrase {:?} is empty after normalization",
                self.phrase
            )));
        }
        Ok(())
    }
}

/// Spoken feedback configuration
#[derive(Debug, Clone, Serialize)]
pub struct SpeechConfig {
    /// Window in which an identical utterance is not repeated
    pub repeat_window_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            repeat_window_ms: 3000,
        }
    }
}

impl SpeechConfig {
    /// Repeat suppression window
    #[must_use]
    pub const fn repeat_window(&self) -> Duration {
        Duration::from_millis(self.repeat_window_ms)
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// Precedence is env > file > default.
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid or an
    /// environment value cannot be parsed
    pub fn from_sources(
        fc: file::VisionConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = RecognitionConfig::default();
        let rc = fc.recognition;

        let recognition = RecognitionConfig {
            wake_threshold: parse_env(&env, "VISION_WAKE_THRESHOLD")?
                .or(rc.wake_threshold)
                .unwrap_or(defaults.wake_threshold),
            command_threshold: parse_env(&env, "VISION_COMMAND_THRESHOLD")?
                .or(rc.command_threshold)
                .unwrap_or(defaults.command_threshold),
            confidence_floor: parse_env(&env, "VISION_CONFIDENCE_FLOOR")?
                .or(rc.confidence_floor)
                .unwrap_or(defaults.confidence_floor),
            fallback_confidence: rc
                .fallback_confidence
                .unwrap_or(defaults.fallback_confidence),
            duplicate_window: rc.duplicate_window.unwrap_or(defaults.duplicate_window),
            history_capacity: rc.history_capacity.unwrap_or(defaults.history_capacity),
            backoff_base_ms: rc.backoff_base_ms.unwrap_or(defaults.backoff_base_ms),
            backoff_cap_ms: rc.backoff_cap_ms.unwrap_or(defaults.backoff_cap_ms),
            max_errors: rc.max_errors.unwrap_or(defaults.max_errors),
            restart_delay_ms: rc.restart_delay_ms.unwrap_or(defaults.restart_delay_ms),
            inactivity_prompt_ms: rc
                .inactivity_prompt_ms
                .unwrap_or(defaults.inactivity_prompt_ms),
            cooldown_ms: rc.cooldown_ms.unwrap_or(defaults.cooldown_ms),
            adaptive_learning: rc.adaptive_learning.unwrap_or(defaults.adaptive_learning),
        };

        let wc = fc.wake_word;
        let phrase = env("VISION_WAKE_PHRASE")
            .or(wc.phrase)
            .unwrap_or_else(|| DEFAULT_WAKE_PHRASE.to_string());
        let base = WakeWordConfig::for_phrase(&phrase);
        let wake_word = WakeWordConfig {
            phrase: base.phrase,
            variants: wc.variants.unwrap_or(base.variants),
            phonetic_variants: wc.phonetic_variants.unwrap_or(base.phonetic_variants),
            aliases: wc.aliases.unwrap_or(base.aliases),
        };

        let speech = SpeechConfig {
            repeat_window_ms: fc
                .speech
                .repeat_window_ms
                .unwrap_or(SpeechConfig::default().repeat_window_ms),
        };

        let config = Self {
            recognition,
            wake_word,
            speech,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every section
    ///
    /// Run again after any override applied on top of [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns the first section error
    pub fn validate(&self) -> Result<()> {
        self.recognition.validate()?;
        self.wake_word.validate()
    }
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::file::{RecognitionFileConfig, VisionConfigFile, WakeWordFileConfig};
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::from_sources(VisionConfigFile::default(), no_env).unwrap();
        assert!((config.recognition.wake_threshold - 0.65).abs() < f64::EPSILON);
        assert!((config.recognition.command_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.recognition.duplicate_window, 3);
        assert_eq!(config.recognition.backoff_cap_ms, 10_000);
        assert_eq!(config.recognition.max_errors, 5);
        assert_eq!(config.wake_word.phrase, DEFAULT_WAKE_PHRASE);
        assert!(config.wake_word.aliases.contains(&"vision".to_string()));
    }

    #[test]
    fn env_overrides_file() {
        let fc = VisionConfigFile {
            recognition: RecognitionFileConfig {
                wake_threshold: Some(0.5),
                cooldown_ms: Some(1000),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = Config::from_sources(fc, |key| {
            (key == "VISION_WAKE_THRESHOLD").then(|| "0.8".to_string())
        })
        .unwrap();

        assert!((config.recognition.wake_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.recognition.cooldown_ms, 1000);
    }

    #[test]
    fn invalid_env_value_is_rejected() {
        let result = Config::from_sources(VisionConfigFile::default(), |key| {
            (key == "VISION_COMMAND_THRESHOLD").then(|| "high".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let fc = VisionConfigFile {
            recognition: RecognitionFileConfig {
                command_threshold: Some(1.5),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(Config::from_sources(fc, no_env).is_err());
    }

    #[test]
    fn custom_phrase_drops_default_variants() {
        let fc = VisionConfigFile {
            wake_word: WakeWordFileConfig {
                phrase: Some("Hello Aura".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = Config::from_sources(fc, no_env).unwrap();
        assert_eq!(config.wake_word.phrase, "hello aura");
        assert_eq!(config.wake_word.variants, vec!["hello aura".to_string()]);
        assert!(config.wake_word.aliases.is_empty());
    }

    #[test]
    fn blank_wake_phrase_is_rejected() {
        let result = Config::from_sources(VisionConfigFile::default(), |key| {
            (key == "VISION_WAKE_PHRASE").then(|| "  ".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn phrase_override_is_validated() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.wake_word = WakeWordConfig::for_phrase("");
        assert!(config.validate().is_err());

        // Only stop words and punctuation: nothing left to detect
        config.wake_word = WakeWordConfig::for_phrase("the, um!");
        assert!(config.validate().is_err());

        config.wake_word = WakeWordConfig::for_phrase("Hello Aura");
        assert!(config.validate().is_ok());
    }
}
