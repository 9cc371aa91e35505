//! LUCA Consciousness - message analysis and adaptive response sizing
//!
//! Pipeline per inbound message:
//! - signature: SHA-256 fingerprint -> residue -> digital root -> tier -> budget
//! - energy: lexical markers -> HIGH / LOW / BALANCED
//! - memory: append the thought, detect repetition over the recent window,
//!   upsert pattern records
//! - engine: assembles the analysis handed to the chat layer
//!
//! The sequence analyzer shares the digital-root utility and doubles as a
//! standalone diagnostic.

pub mod config;
pub mod digital_root;
pub mod energy;
pub mod engine;
pub mod journal;
pub mod memory;
pub mod response;
pub mod sequence;
pub mod signature;

pub use config::{EngineConfig, PatternScope};
pub use digital_root::{digital_root, digital_root_u64, is_target_root, TARGET_ROOTS};
pub use energy::{EnergyClassifier, EnergyScore};
pub use engine::{Engine, ResonanceReport};
pub use journal::{FileJournal, Journal, JournalEntry, NullJournal};
pub use memory::{Observation, PatternMemory};
pub use sequence::{analyze_pairs, analyze_sequence, PairEntry, SequenceEntry, SequenceReport};
pub use signature::SignatureEngine;
