//! Command matching
//!
//! Maps the text that followed the wake phrase to one of a small, fixed set
//! of actions. Every phrase in the table is scored with [`fused_similarity`];
//! context keywords, the current application mode and past outcomes then
//! adjust the best score before it is compared with the acceptance
//! threshold.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::actions::AppMode;
use super::learning::LearningStats;
use crate::matching::{fused_similarity, normalize};
use crate::{Error, Result};

/// Relative weight of phonetic variants against literal patterns
const PHONETIC_WEIGHT: f64 = 0.9;

/// Relative weight of aliases against literal patterns
const ALIAS_WEIGHT: f64 = 0.95;

/// Boost when a context keyword appears in the utterance
const CONTEXT_TAG_BOOST: f64 = 1.25;

/// Boost when the action continues the current mode
const MODE_CONTINUITY_BOOST: f64 = 1.15;

/// Minimum similarity for a "did you mean" suggestion
pub const SUGGESTION_FLOOR: f64 = 0.4;

/// An action the assistant can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Camera,
    Navigation,
    Emergency,
    Settings,
    Status,
    Help,
}

impl CommandAction {
    /// All actions in table declaration order
    pub const ALL: [Self; 6] = [
        Self::Camera,
        Self::Navigation,
        Self::Emergency,
        Self::Settings,
        Self::Status,
        Self::Help,
    ];

    /// Lowercase action name, also the literal command word
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Navigation => "navigation",
            Self::Emergency => "emergency",
            Self::Settings => "settings",
            Self::Status => "status",
            Self::Help => "help",
        }
    }

    /// The mode panel this action opens, if any
    #[must_use]
    pub const fn mode(self) -> Option<AppMode> {
        match self {
            Self::Camera => Some(AppMode::Camera),
            Self::Navigation => Some(AppMode::Navigation),
            Self::Emergency => Some(AppMode::Emergency),
            Self::Settings => Some(AppMode::Settings),
            Self::Status | Self::Help => None,
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommandAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == name)
            .ok_or_else(|| Error::Config(format!("unknown command action: {s}")))
    }
}

/// Phrases that trigger one action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandPattern {
    pub action: CommandAction,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub phonetic_variants: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub context_tags: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

const fn default_weight() -> f64 {
    1.0
}

impl CommandPattern {
    /// Pattern whose only phrase is the action name
    #[must_use]
    pub fn new(action: CommandAction) -> Self {
        Self {
            action,
            patterns: vec![action.as_str().to_string()],
            phonetic_variants: Vec::new(),
            aliases: Vec::new(),
            context_tags: Vec::new(),
            weight: default_weight(),
        }
    }

    /// Add literal phrases
    #[must_use]
    pub fn with_patterns(mut self, phrases: &[&str]) -> Self {
        self.patterns.extend(phrases.iter().map(ToString::to_string));
        self
    }

    /// Add phonetic misspellings
    #[must_use]
    pub fn with_phonetic(mut self, phrases: &[&str]) -> Self {
        self.phonetic_variants
            .extend(phrases.iter().map(ToString::to_string));
        self
    }

    /// Add alias phrases
    #[must_use]
    pub fn with_aliases(mut self, phrases: &[&str]) -> Self {
        self.aliases.extend(phrases.iter().map(ToString::to_string));
        self
    }

    /// Add context keywords
    #[must_use]
    pub fn with_context_tags(mut self, tags: &[&str]) -> Self {
        self.context_tags.extend(tags.iter().map(ToString::to_string));
        self
    }

    /// Set the prior weight
    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    fn normalized(self) -> Self {
        let norm = |items: Vec<String>| -> Vec<String> {
            let mut out: Vec<String> = Vec::with_capacity(items.len());
            for item in items.iter().map(|s| normalize(s)) {
                if !item.is_empty() && !out.contains(&item) {
                    out.push(item);
                }
            }
            out
        };

        Self {
            action: self.action,
            patterns: norm(self.patterns),
            phonetic_variants: norm(self.phonetic_variants),
            aliases: norm(self.aliases),
            context_tags: norm(self.context_tags),
            weight: self.weight,
        }
    }
}

/// Validated, normalized command table
#[derive(Debug, Clone)]
pub struct CommandTable {
    patterns: Vec<CommandPattern>,
}

impl CommandTable {
    /// Build a table, normalizing every phrase
    ///
    /// # Errors
    ///
    /// Returns error if an action appears twice, a pattern lacks its literal
    /// command name, or a weight is not a positive finite number
    pub fn new(patterns: Vec<CommandPattern>) -> Result<Self> {
        let mut seen: Vec<CommandAction> = Vec::with_capacity(patterns.len());
        let mut normalized = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let pattern = pattern.normalized();
            if seen.contains(&pattern.action) {
                return Err(Error::Config(format!(
                    "duplicate command action: {}",
                    pattern.action
                )));
            }
            if !pattern.patterns.iter().any(|p| p == pattern.action.as_str()) {
                return Err(Error::Config(format!(
                    "command {} must include its literal name",
                    pattern.action
                )));
            }
            if !pattern.weight.is_finite() || pattern.weight <= 0.0 {
                return Err(Error::Config(format!(
                    "command {} has invalid weight {}",
                    pattern.action, pattern.weight
                )));
            }
            seen.push(pattern.action);
            normalized.push(pattern);
        }

        Ok(Self {
            patterns: normalized,
        })
    }

    /// Patterns in declaration order
    #[must_use]
    pub fn patterns(&self) -> &[CommandPattern] {
        &self.patterns
    }

    /// Action names in declaration order
    #[must_use]
    pub fn action_names(&self) -> Vec<&'static str> {
        self.patterns.iter().map(|p| p.action.as_str()).collect()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self {
            patterns: default_patterns()
                .into_iter()
                .map(CommandPattern::normalized)
                .collect(),
        }
    }
}

fn default_patterns() -> Vec<CommandPattern> {
    vec![
        CommandPattern::new(CommandAction::Camera)
            .with_patterns(&[
                "open camera",
                "start camera",
                "take picture",
                "take photo",
                "what do you see",
                "describe scene",
                "detect objects",
            ])
            .with_phonetic(&["kamera", "camra", "cammera"])
            .with_aliases(&["photo", "picture", "snapshot"])
            .with_context_tags(&["see", "look", "picture", "photo", "scan", "object"]),
        CommandPattern::new(CommandAction::Navigation)
            .with_patterns(&[
                "navigate",
                "directions",
                "where am i",
                "guide me",
                "start navigation",
            ])
            .with_phonetic(&["navigashun", "naviation", "navagation"])
            .with_aliases(&["route", "walk"])
            .with_context_tags(&["where", "route", "direction", "walk", "street"]),
        CommandPattern::new(CommandAction::Emergency)
            .with_patterns(&["call emergency", "sos", "danger", "call for help"])
            .with_phonetic(&["emergensy", "emerjency", "emergancy"])
            .with_aliases(&["urgent", "911"])
            .with_context_tags(&["danger", "hurt", "fall", "ambulance", "police"])
            .with_weight(0.95),
        CommandPattern::new(CommandAction::Settings)
            .with_patterns(&[
                "open settings",
                "preferences",
                "volume up",
                "volume down",
                "speak faster",
                "speak slower",
            ])
            .with_phonetic(&["setings", "settins", "seddings"])
            .with_aliases(&["options", "configure", "config"])
            .with_context_tags(&["volume", "speed", "voice", "louder", "quieter", "faster", "slower"]),
        CommandPattern::new(CommandAction::Status)
            .with_patterns(&["system status", "battery", "what mode", "report"])
            .with_phonetic(&["stadus", "statis"])
            .with_aliases(&["state"])
            .with_context_tags(&["battery", "mode", "running"])
            .with_weight(0.95),
        CommandPattern::new(CommandAction::Help)
            .with_patterns(&["commands", "what can you do", "list commands"])
            .with_phonetic(&["halp", "hep"])
            .with_aliases(&["assist", "instructions"]),
    ]
}

/// Which phrase kind produced the best score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Literal,
    Phonetic,
    Alias,
}

/// A scored command candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandMatch {
    pub action: CommandAction,
    pub confidence: f64,
    pub method: MatchMethod,
    /// The table phrase that scored best
    pub phrase: String,
}

/// Scores residual text against a [`CommandTable`]
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    table: CommandTable,
    threshold: f64,
    adaptive: bool,
}

impl CommandMatcher {
    #[must_use]
    pub const fn new(table: CommandTable, threshold: f64, adaptive: bool) -> Self {
        Self {
            table,
            threshold,
            adaptive,
        }
    }

    /// Acceptance threshold
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub const fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Best candidate regardless of the acceptance threshold
    ///
    /// Ties keep the earliest pattern in declaration order.
    #[must_use]
    pub fn score(
        &self,
        residual: &str,
        mode: AppMode,
        learning: &LearningStats,
    ) -> Option<CommandMatch> {
        let text = normalize(residual);
        let mut best: Option<CommandMatch> = None;

        for pattern in &self.table.patterns {
            let Some((raw, method, phrase)) = best_phrase(&text, pattern) else {
                continue;
            };

            let mut confidence = raw;
            if pattern
                .context_tags
                .iter()
                .any(|tag| text.contains(tag.as_str()))
            {
                confidence *= CONTEXT_TAG_BOOST;
            }
            if pattern.action.mode() == Some(mode) {
                confidence *= MODE_CONTINUITY_BOOST;
            }
            if self.adaptive {
                confidence *= learning.multiplier(pattern.action.as_str());
            }
            let confidence = confidence.clamp(0.0, 1.0);

            if best.as_ref().is_none_or(|b| confidence > b.confidence) {
                best = Some(CommandMatch {
                    action: pattern.action,
                    confidence,
                    method,
                    phrase: phrase.to_string(),
                });
            }
        }

        best
    }

    /// Best candidate whose confidence exceeds the threshold
    #[must_use]
    pub fn match_command(
        &self,
        residual: &str,
        mode: AppMode,
        learning: &LearningStats,
    ) -> Option<CommandMatch> {
        let candidate = self.score(residual, mode, learning)?;
        tracing::debug!(
            action = %candidate.action,
            confidence = candidate.confidence,
            method = ?candidate.method,
            threshold = self.threshold,
            "command candidate"
        );
        (candidate.confidence > self.threshold).then_some(candidate)
    }

    /// The closest literal phrase, if it clears [`SUGGESTION_FLOOR`]
    #[must_use]
    pub fn suggest(&self, residual: &str) -> Option<String> {
        let text = normalize(residual);
        let mut best: Option<(&str, f64)> = None;
        for phrase in self.table.patterns.iter().flat_map(|p| &p.patterns) {
            let score = fused_similarity(&text, phrase);
            if score > SUGGESTION_FLOOR && best.is_none_or(|(_, s)| score > s) {
                best = Some((phrase, score));
            }
        }
        best.map(|(phrase, _)| phrase.to_string())
    }
}

/// Best weighted phrase score within one pattern
fn best_phrase<'a>(text: &str, pattern: &'a CommandPattern) -> Option<(f64, MatchMethod, &'a str)> {
    let groups = [
        (&pattern.patterns, MatchMethod::Literal, 1.0),
        (&pattern.phonetic_variants, MatchMethod::Phonetic, PHONETIC_WEIGHT),
        (&pattern.aliases, MatchMethod::Alias, ALIAS_WEIGHT),
    ];

    let mut best: Option<(f64, MatchMethod, &str)> = None;
    for (phrases, method, factor) in groups {
        for phrase in phrases {
            let score = fused_similarity(text, phrase) * pattern.weight * factor;
            if best.is_none_or(|(s, _, _)| score > s) {
                best = Some((score, method, phrase.as_str()));
            }
        }
    }
    best
}
