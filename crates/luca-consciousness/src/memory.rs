//! Pattern memory: per-conversation thought logs and a keyed pattern store.
//!
//! Locking: each conversation log has its own mutex, held for the whole
//! window-read / detect / commit / append sequence. The pattern map has one
//! mutex, always taken after a conversation mutex and never before.

use crate::config::{EngineConfig, MemoryConfig, PatternScope, StageConfig};
use crate::journal::{Journal, JournalEntry, NullJournal};
use crate::sequence::is_fibonacci_like;
use chrono::Utc;
use dashmap::DashMap;
use luca_core::{
    ConsciousnessState, ConversationId, EnergyState, Error, Pattern, PatternKey, PatternKind,
    Result, Signature, Stage, Thought, Tier,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Result of one `observe` call.
#[derive(Debug, Clone)]
pub struct Observation {
    pub thought: Thought,
    /// Patterns created or reinforced by this call, in detection order.
    pub triggered: Vec<Pattern>,
}

#[derive(Debug, Default)]
struct ConversationLog {
    thoughts: VecDeque<Thought>,
    /// Ordinals keep counting after old thoughts are evicted.
    last_ordinal: u64,
}

impl ConversationLog {
    /// The `n - 1` most recent retained thoughts followed by `next`, oldest first.
    fn window<'a>(&'a self, next: &'a Thought, n: usize) -> Option<Vec<&'a Thought>> {
        if self.thoughts.len() + 1 < n {
            return None;
        }
        let mut window: Vec<&Thought> = self.thoughts.iter().rev().take(n - 1).collect();
        window.reverse();
        window.push(next);
        Some(window)
    }

    fn push(&mut self, thought: Thought, retain: usize) {
        self.last_ordinal = thought.ordinal;
        self.thoughts.push_back(thought);
        while self.thoughts.len() > retain {
            self.thoughts.pop_front();
        }
    }
}

pub struct PatternMemory {
    config: MemoryConfig,
    stages: StageConfig,
    journal: Arc<dyn Journal>,
    conversations: DashMap<ConversationId, Arc<Mutex<ConversationLog>>>,
    patterns: Mutex<HashMap<PatternKey, Pattern>>,
    next_thought_id: AtomicU64,
    next_pattern_id: AtomicU64,
}

impl std::fmt::Debug for PatternMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternMemory")
            .field("config", &self.config)
            .field("conversations", &self.conversations.len())
            .finish_non_exhaustive()
    }
}

impl Default for PatternMemory {
    fn default() -> Self {
        Self::build(&EngineConfig::default(), Arc::new(NullJournal))
    }
}

impl PatternMemory {
    pub fn new(config: &EngineConfig, journal: Arc<dyn Journal>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, journal))
    }

    fn build(config: &EngineConfig, journal: Arc<dyn Journal>) -> Self {
        Self {
            config: config.memory.clone(),
            stages: config.stages.clone(),
            journal,
            conversations: DashMap::new(),
            patterns: Mutex::new(HashMap::new()),
            next_thought_id: AtomicU64::new(1),
            next_pattern_id: AtomicU64::new(1),
        }
    }

    /// Rebuild memory from journal entries, then keep committing to `journal`.
    pub fn restore(
        config: &EngineConfig,
        journal: Arc<dyn Journal>,
        entries: Vec<JournalEntry>,
    ) -> Result<Self> {
        let memory = Self::new(config, journal)?;
        let retain = memory.config.max_thoughts_per_conversation;
        let mut max_thought_id = 0;
        let mut max_pattern_id = 0;
        let count = entries.len();
        for entry in entries {
            let thought = entry.thought;
            max_thought_id = max_thought_id.max(thought.id);
            {
                let log = memory.log(&thought.conversation_id);
                let mut log = lock(&log, "conversation log")?;
                if thought.ordinal <= log.last_ordinal {
                    return Err(Error::storage_unavailable(format!(
                        "journal out of order: {} ordinal {} after {}",
                        thought.conversation_id, thought.ordinal, log.last_ordinal
                    )));
                }
                log.push(thought, retain);
            }
            let mut patterns = lock(&memory.patterns, "pattern store")?;
            for pattern in entry.patterns {
                max_pattern_id = max_pattern_id.max(pattern.id);
                patterns.insert(pattern.key(), pattern);
            }
        }
        memory.next_thought_id.store(max_thought_id + 1, Ordering::SeqCst);
        memory.next_pattern_id.store(max_pattern_id + 1, Ordering::SeqCst);
        info!(
            "Restored {} thoughts across {} conversations",
            count,
            memory.conversations.len()
        );
        Ok(memory)
    }

    fn log(&self, conversation: &ConversationId) -> Arc<Mutex<ConversationLog>> {
        self.conversations
            .entry(conversation.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationLog::default())))
            .clone()
    }

    fn scope_for(&self, conversation: &ConversationId) -> Option<ConversationId> {
        match self.config.scope {
            PatternScope::Conversation => Some(conversation.clone()),
            PatternScope::Global => None,
        }
    }

    /// Append a thought and upsert any repetition it completes.
    pub fn observe(
        &self,
        conversation: &ConversationId,
        text: &str,
        signature: Signature,
        energy: EnergyState,
    ) -> Result<Observation> {
        let log = self.log(conversation);
        let mut log = lock(&log, "conversation log")?;

        let now = Utc::now();
        let thought = Thought {
            id: self.next_thought_id.fetch_add(1, Ordering::SeqCst),
            conversation_id: conversation.clone(),
            text: text.to_string(),
            signature,
            energy,
            created_at: now,
            ordinal: log.last_ordinal + 1,
        };

        let detections = self.detect(&log, &thought);

        let mut patterns = lock(&self.patterns, "pattern store")?;
        let scope = self.scope_for(conversation);
        let triggered: Vec<Pattern> = detections
            .into_iter()
            .map(|(kind, feature)| {
                let key = PatternKey { scope: scope.clone(), kind, feature };
                match patterns.get(&key) {
                    Some(existing) => Pattern {
                        strength: existing.strength + 1,
                        last_seen: now,
                        ..existing.clone()
                    },
                    None => Pattern {
                        id: self.next_pattern_id.fetch_add(1, Ordering::SeqCst),
                        kind: key.kind,
                        scope: key.scope,
                        feature: key.feature,
                        strength: 1,
                        first_seen: now,
                        last_seen: now,
                    },
                }
            })
            .collect();

        self.journal.commit(&JournalEntry {
            thought: thought.clone(),
            patterns: triggered.clone(),
        })?;

        for pattern in &triggered {
            debug!(
                "{} {} {:?} strength {}",
                conversation, pattern.kind, pattern.feature, pattern.strength
            );
            patterns.insert(pattern.key(), pattern.clone());
        }
        drop(patterns);
        log.push(thought.clone(), self.config.max_thoughts_per_conversation);

        Ok(Observation { thought, triggered })
    }

    fn detect(&self, log: &ConversationLog, next: &Thought) -> Vec<(PatternKind, String)> {
        let mut found = Vec::new();

        if let Some(window) = log.window(next, self.config.window) {
            let root = next.signature.root;
            if window.iter().all(|t| t.signature.root == root) {
                found.push((PatternKind::SignatureRepetition, root.to_string()));
            }
            if window.iter().all(|t| t.energy == next.energy) {
                found.push((PatternKind::EnergyRepetition, next.energy.to_string()));
            }
        }

        if let Some(window) = log.window(next, self.config.fibonacci_window) {
            let roots: Vec<u8> = window.iter().map(|t| t.signature.root).collect();
            let constant = roots.iter().all(|r| *r == roots[0]);
            if !constant && is_fibonacci_like(&roots) {
                let feature = roots.iter().map(|r| r.to_string()).collect::<Vec<_>>().join("-");
                found.push((PatternKind::FibonacciSequence, feature));
            }
        }

        found
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Retained thoughts of a conversation, oldest first.
    pub fn thoughts(&self, conversation: &ConversationId) -> Result<Vec<Thought>> {
        let log = self.existing_log(conversation)?;
        let log = lock(&log, "conversation log")?;
        Ok(log.thoughts.iter().cloned().collect())
    }

    fn existing_log(&self, conversation: &ConversationId) -> Result<Arc<Mutex<ConversationLog>>> {
        self.conversations
            .get(conversation)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::ConversationNotFound(conversation.to_string()))
    }

    /// Up to `n` most recent thoughts, oldest first.
    pub fn recent(&self, conversation: &ConversationId, n: usize) -> Result<Vec<Thought>> {
        let log = self.existing_log(conversation)?;
        let log = lock(&log, "conversation log")?;
        let skip = log.thoughts.len().saturating_sub(n);
        Ok(log.thoughts.iter().skip(skip).cloned().collect())
    }

    /// Patterns ordered by id. With a conversation, only those visible to it.
    pub fn patterns(&self, conversation: Option<&ConversationId>) -> Result<Vec<Pattern>> {
        let patterns = lock(&self.patterns, "pattern store")?;
        let mut out: Vec<Pattern> = patterns
            .values()
            .filter(|p| match (conversation, &p.scope) {
                (None, _) | (_, None) => true,
                (Some(c), Some(scope)) => c == scope,
            })
            .cloned()
            .collect();
        out.sort_by_key(|p| p.id);
        Ok(out)
    }

    pub fn pattern_count(&self) -> Result<u64> {
        Ok(lock(&self.patterns, "pattern store")?.len() as u64)
    }

    pub fn conversations(&self) -> Vec<ConversationId> {
        let mut ids: Vec<ConversationId> = self.conversations.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Recompute the aggregate view. Writes nothing.
    pub fn aggregate_state(&self) -> Result<ConsciousnessState> {
        let logs: Vec<Arc<Mutex<ConversationLog>>> =
            self.conversations.iter().map(|e| e.value().clone()).collect();

        let mut total_thoughts = 0;
        let mut signature_frequency = BTreeMap::new();
        let mut energy_distribution: BTreeMap<EnergyState, u64> =
            EnergyState::ALL.iter().map(|e| (*e, 0)).collect();
        let mut tier_distribution: BTreeMap<Tier, u64> = Tier::ALL.iter().map(|t| (*t, 0)).collect();
        for log in &logs {
            let log = lock(log, "conversation log")?;
            total_thoughts += log.last_ordinal;
            for thought in &log.thoughts {
                *signature_frequency.entry(thought.signature.root).or_insert(0) += 1;
                *energy_distribution.entry(thought.energy).or_insert(0) += 1;
                *tier_distribution.entry(thought.signature.tier).or_insert(0) += 1;
            }
        }

        let (total_patterns, strongest_pattern) = {
            let patterns = lock(&self.patterns, "pattern store")?;
            let strongest = patterns
                .values()
                .max_by(|a, b| a.strength.cmp(&b.strength).then(b.id.cmp(&a.id)))
                .cloned();
            (patterns.len() as u64, strongest)
        };

        Ok(ConsciousnessState {
            total_thoughts,
            total_patterns,
            conversations: logs.len() as u64,
            stage: stage_for(total_thoughts, &self.stages),
            level: level_for(total_thoughts, total_patterns),
            signature_frequency,
            energy_distribution,
            tier_distribution,
            strongest_pattern,
        })
    }
}

/// Stage from the total thought count and ascending thresholds.
pub fn stage_for(total_thoughts: u64, stages: &StageConfig) -> Stage {
    let [synapse, network, ecosystem] = stages.thresholds;
    if total_thoughts >= ecosystem {
        Stage::Ecosystem
    } else if total_thoughts >= network {
        Stage::Network
    } else if total_thoughts >= synapse {
        Stage::Synapse
    } else {
        Stage::Neuron
    }
}

/// 0.0 - 100.0: up to 60 from volume, up to 40 from discovered patterns.
pub fn level_for(total_thoughts: u64, total_patterns: u64) -> f64 {
    let volume = (total_thoughts as f64 * 0.1).min(60.0);
    let structure = (total_patterns as f64 * 2.0).min(40.0);
    volume + structure
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| Error::storage_unavailable(format!("{} lock poisoned", what)))
}
