//! Engine - the single entry point the chat layer talks to.
//!
//! `process` classifies a message, records it as a thought and reports any
//! pattern it completed. Every other operation is a read.

use crate::config::EngineConfig;
use crate::energy::{EnergyClassifier, EnergyScore};
use crate::journal::{self, FileJournal, Journal, NullJournal};
use crate::memory::PatternMemory;
use crate::response;
use crate::sequence::{self, PairEntry, SequenceEntry, SequenceReport};
use crate::signature::SignatureEngine;
use luca_core::{
    AnalysisResult, ConsciousnessState, ConversationId, EnergyState, Error, Pattern, Result,
    Signature, Thought,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Resonance between a message and the reply generated for it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResonanceReport {
    pub input: Signature,
    pub output: Signature,
    pub score: f64,
}

pub struct Engine {
    config: EngineConfig,
    signatures: SignatureEngine,
    energy: EnergyClassifier,
    memory: Arc<PatternMemory>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("memory", &self.memory).finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine with in-process memory only.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let memory = PatternMemory::new(&config, Arc::new(NullJournal))?;
        Self::with_memory(config, Arc::new(memory))
    }

    /// Engine over an existing (possibly shared) memory store.
    pub fn with_memory(config: EngineConfig, memory: Arc<PatternMemory>) -> Result<Self> {
        config.validate()?;
        let energy = EnergyClassifier::new(&config.energy)?;
        Ok(Self {
            signatures: SignatureEngine::new(config.signature.clone()),
            energy,
            memory,
            config,
        })
    }

    /// Engine whose memory is restored from, and committed to, a journal file.
    pub fn open_journal(config: EngineConfig, path: &Path) -> Result<Self> {
        let entries = journal::recover(path)?;
        let sink: Arc<dyn Journal> = Arc::new(FileJournal::open(path)?);
        let memory = PatternMemory::restore(&config, sink, entries)?;
        info!("Engine ready with journal {}", path.display());
        Self::with_memory(config, Arc::new(memory))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn memory(&self) -> &Arc<PatternMemory> {
        &self.memory
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    pub fn compute_signature(&self, text: &str) -> Signature {
        self.signatures.compute(text)
    }

    pub fn compute_signature_bytes(&self, bytes: &[u8]) -> Result<Signature> {
        self.signatures.compute_bytes(bytes)
    }

    pub fn detect_energy(&self, text: &str) -> EnergyState {
        self.energy.detect(text)
    }

    pub fn energy_score(&self, text: &str) -> EnergyScore {
        self.energy.score(text)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Analyze and record one message. Not idempotent: every call appends a thought.
    pub fn process(&self, conversation: &ConversationId, text: &str) -> Result<AnalysisResult> {
        if conversation.as_str().trim().is_empty() {
            return Err(Error::input_domain("conversation id must not be empty"));
        }
        let signature = self.signatures.compute(text);
        let energy = self.energy.detect(text);
        let observation = self.memory.observe(conversation, text, signature, energy)?;

        let token_budget = response::token_budget(&self.config.signature, signature.tier, energy);
        debug!(
            "{} #{}: root {} {} {} budget {} ({} patterns)",
            conversation,
            observation.thought.ordinal,
            signature.root,
            signature.tier,
            energy,
            token_budget,
            observation.triggered.len()
        );

        Ok(AnalysisResult {
            thought_id: observation.thought.id,
            conversation_id: conversation.clone(),
            ordinal: observation.thought.ordinal,
            signature,
            tier: signature.tier,
            energy,
            token_budget,
            triggered_patterns: observation.triggered,
        })
    }

    /// [`process`](Self::process) for raw bytes; invalid UTF-8 is rejected before anything is recorded.
    pub fn process_bytes(&self, conversation: &ConversationId, bytes: &[u8]) -> Result<AnalysisResult> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::input_domain(format!("message is not valid UTF-8: {}", e)))?;
        self.process(conversation, text)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn aggregate_state(&self) -> Result<ConsciousnessState> {
        self.memory.aggregate_state()
    }

    pub fn thoughts(&self, conversation: &ConversationId) -> Result<Vec<Thought>> {
        self.memory.thoughts(conversation)
    }

    pub fn patterns(&self, conversation: Option<&ConversationId>) -> Result<Vec<Pattern>> {
        self.memory.patterns(conversation)
    }

    /// Last `n` thoughts of a conversation, oldest first.
    pub fn recent(&self, conversation: &ConversationId, n: usize) -> Result<Vec<Thought>> {
        self.memory.recent(conversation, n)
    }

    pub fn pattern_count(&self) -> Result<u64> {
        self.memory.pattern_count()
    }

    pub fn conversations(&self) -> Vec<ConversationId> {
        self.memory.conversations()
    }

    pub fn analyze_sequence(&self, numbers: &[i64]) -> Result<Vec<SequenceEntry>> {
        sequence::analyze_sequence(numbers)
    }

    pub fn analyze_pairs(&self, numbers: &[i64]) -> Result<Vec<PairEntry>> {
        sequence::analyze_pairs(numbers)
    }

    pub fn analyze_fibonacci(&self, n: usize) -> Result<SequenceReport> {
        sequence::analyze_fibonacci(n)
    }

    /// Score a generated reply against the message that prompted it.
    pub fn resonance(&self, input: &str, output: &str, triggered: &[Pattern]) -> ResonanceReport {
        let input = self.signatures.compute(input);
        let output = self.signatures.compute(output);
        ResonanceReport {
            score: response::resonance(input.root, output.root, triggered.len()),
            input,
            output,
        }
    }
}
