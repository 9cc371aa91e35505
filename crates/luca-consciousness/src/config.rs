//! Engine configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use luca_core::{Error, Result, Tier};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Signature reduction and budget table.
    pub signature: SignatureConfig,
    /// Energy marker vocabularies and thresholds.
    pub energy: EnergyConfig,
    /// Thought log and pattern detection parameters.
    pub memory: MemoryConfig,
    /// Stage thresholds over the total thought count.
    pub stages: StageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignatureConfig {
    /// Modulus applied to the text hash before taking the digital root.
    pub modulus: u64,
    /// Token budget for the Foundation tier.
    pub foundation_budget: u32,
    /// Token budget for the Expansion tier.
    pub expansion_budget: u32,
    /// Token budget for the Mastery tier.
    pub mastery_budget: u32,
    /// Lower bound applied when a low-energy message halves the budget.
    pub low_energy_floor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnergyConfig {
    /// Minimum marker score for a HIGH or LOW classification.
    pub threshold: u32,
    /// Messages longer than this many characters count as a high marker.
    pub long_message_chars: usize,
    /// Non-empty messages shorter than this many characters count as a low marker.
    pub short_message_chars: usize,
    pub high_keywords: Vec<String>,
    pub low_keywords: Vec<String>,
    /// Emoji whose presence counts as a high marker.
    pub high_emoji: Vec<String>,
}

/// Where pattern records live.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatternScope {
    /// One pattern keyspace per conversation.
    #[default]
    Conversation,
    /// A single keyspace shared by every conversation.
    Global,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    /// Number of most recent thoughts that must agree for a repetition.
    pub window: usize,
    /// Number of most recent signature roots checked for a fibonacci run.
    pub fibonacci_window: usize,
    /// Thoughts retained per conversation; older records are evicted.
    pub max_thoughts_per_conversation: usize,
    pub scope: PatternScope,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageConfig {
    /// Total thought counts at which SYNAPSE, NETWORK and ECOSYSTEM begin.
    pub thresholds: [u64; 3],
}

// ============================================================
// Defaults
// ============================================================

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            modulus: 162,
            foundation_budget: 369,
            expansion_budget: 666,
            mastery_budget: 999,
            low_energy_floor: 200,
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            threshold: 2,
            long_message_chars: 200,
            short_message_chars: 20,
            high_keywords: vec!["awesome".into(), "amazing".into(), "let's go".into()],
            low_keywords: vec!["tired".into(), "foggy".into(), "confused".into(), "ugh".into()],
            high_emoji: vec!["🚀".into(), "🔥".into(), "⚡".into()],
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window: 3,
            fibonacci_window: 5,
            max_thoughts_per_conversation: 10_000,
            scope: PatternScope::Conversation,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self { thresholds: [100, 1_000, 10_000] }
    }
}

// ============================================================
// Loading
// ============================================================

impl EngineConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Rejected {}: {}; using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.signature.modulus == 0 {
            return Err(Error::config("signature.modulus must be positive"));
        }
        if self.memory.window < 3 {
            return Err(Error::config("memory.window must be at least 3"));
        }
        if self.memory.fibonacci_window < 3 {
            return Err(Error::config("memory.fibonacci_window must be at least 3"));
        }
        let needed = self.memory.window.max(self.memory.fibonacci_window);
        if self.memory.max_thoughts_per_conversation < needed {
            return Err(Error::config(format!(
                "memory.max_thoughts_per_conversation must be at least {}",
                needed
            )));
        }
        let [a, b, c] = self.stages.thresholds;
        if !(a < b && b < c) {
            return Err(Error::config("stages.thresholds must be strictly ascending"));
        }
        if self.energy.threshold == 0 {
            return Err(Error::config("energy.threshold must be positive"));
        }
        Ok(())
    }
}

impl SignatureConfig {
    /// Budget lookup for a tier.
    pub fn budget(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Foundation => self.foundation_budget,
            Tier::Expansion => self.expansion_budget,
            Tier::Mastery => self.mastery_budget,
        }
    }
}
