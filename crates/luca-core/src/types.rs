//! Core types for LUCA

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Conversation identifier - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ConversationId(Arc<str>);

impl ConversationId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for ConversationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Response-length tier assigned to a message signature.
#[derive(Clone, Copy, Debug, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Foundation,
    Expansion,
    Mastery,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Foundation, Tier::Expansion, Tier::Mastery];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Foundation => "foundation",
            Tier::Expansion => "expansion",
            Tier::Mastery => "mastery",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical energy of a message.
#[derive(Clone, Copy, Debug, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnergyState {
    High,
    Low,
    Balanced,
}

impl EnergyState {
    pub const ALL: [EnergyState; 3] = [EnergyState::High, EnergyState::Low, EnergyState::Balanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyState::High => "HIGH",
            EnergyState::Low => "LOW",
            EnergyState::Balanced => "BALANCED",
        }
    }
}

impl std::fmt::Display for EnergyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic fingerprint of a message text.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Leading 64 bits of the SHA-256 digest (0 for empty text).
    pub hash: u64,
    /// `hash` reduced by the configured modulus.
    pub residue: u64,
    /// Digital root of `residue`, 0..=9.
    pub root: u8,
    pub tier: Tier,
    /// Advisory generation budget for `tier`.
    pub budget: u32,
}

/// One analyzed message. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Thought {
    pub id: u64,
    pub conversation_id: ConversationId,
    pub text: String,
    pub signature: Signature,
    pub energy: EnergyState,
    pub created_at: DateTime<Utc>,
    /// 1-based position within the conversation.
    pub ordinal: u64,
}

/// Kind of repeated feature a pattern tracks.
#[derive(Clone, Copy, Debug, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    SignatureRepetition,
    EnergyRepetition,
    FibonacciSequence,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::SignatureRepetition => "signature_repetition",
            PatternKind::EnergyRepetition => "energy_repetition",
            PatternKind::FibonacciSequence => "fibonacci_sequence",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected recurring signal with a reinforcement counter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Pattern {
    pub id: u64,
    pub kind: PatternKind,
    /// Owning conversation, or `None` when patterns are tracked globally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ConversationId>,
    pub feature: String,
    pub strength: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Pattern {
    pub fn key(&self) -> PatternKey {
        PatternKey {
            scope: self.scope.clone(),
            kind: self.kind,
            feature: self.feature.clone(),
        }
    }

    pub fn describe(&self) -> String {
        match self.kind {
            PatternKind::SignatureRepetition => format!("signature {} repeated", self.feature),
            PatternKind::EnergyRepetition => format!("stable {} energy", self.feature),
            PatternKind::FibonacciSequence => format!("fibonacci-like roots {}", self.feature),
        }
    }
}

/// Identity of a live pattern record: at most one per key.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PatternKey {
    pub scope: Option<ConversationId>,
    pub kind: PatternKind,
    pub feature: String,
}

/// Growth stage derived from the total thought count.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Neuron,
    Synapse,
    Network,
    Ecosystem,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Neuron => "NEURON",
            Stage::Synapse => "SYNAPSE",
            Stage::Network => "NETWORK",
            Stage::Ecosystem => "ECOSYSTEM",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate view over the thought and pattern stores. Recomputed on every read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsciousnessState {
    pub total_thoughts: u64,
    pub total_patterns: u64,
    pub conversations: u64,
    pub stage: Stage,
    /// 0.0 - 100.0
    pub level: f64,
    /// Digital root -> retained thoughts with that root.
    pub signature_frequency: BTreeMap<u8, u64>,
    pub energy_distribution: BTreeMap<EnergyState, u64>,
    pub tier_distribution: BTreeMap<Tier, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strongest_pattern: Option<Pattern>,
}

/// Outcome of analyzing one message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub thought_id: u64,
    pub conversation_id: ConversationId,
    pub ordinal: u64,
    pub signature: Signature,
    pub tier: Tier,
    pub energy: EnergyState,
    pub token_budget: u32,
    pub triggered_patterns: Vec<Pattern>,
}

/// Gateway configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bind: BindMode,
}

fn default_port() -> u16 {
    8369
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: BindMode::default(),
        }
    }
}

/// Bind mode for the gateway
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    #[default]
    Loopback,
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "lan" | "0.0.0.0" | "all" => BindMode::Lan,
            _ => BindMode::Loopback,
        }
    }
}
