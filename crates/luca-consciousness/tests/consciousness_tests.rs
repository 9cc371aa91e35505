//! Integration tests for luca-consciousness
//!
//! These tests exercise the public surface of the engine:
//! - determinism of signatures and digital roots
//! - energy classification edge cases
//! - repetition detection and pattern reinforcement through `Engine::process`
//! - aggregate state reads
//! - journal commit, restore, and failure atomicity
//! - concurrent processing within one conversation

use luca_consciousness::config::{EngineConfig, MemoryConfig, PatternScope};
use luca_consciousness::journal::{self, FileJournal, Journal, JournalEntry};
use luca_consciousness::{digital_root, Engine, PatternMemory};
use luca_core::{ConversationId, EnergyState, Error, PatternKind, Stage, Tier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).unwrap()
}

fn conv(id: &str) -> ConversationId {
    ConversationId::new(id)
}

// ============================================================
// Signatures and digital roots
// ============================================================

#[test]
fn signature_is_deterministic() {
    let engine = engine();
    for text in ["", "Hello", "What is a digital root?", "ünïcödé ✨", "long ".repeat(500).as_str()] {
        let first = engine.compute_signature(text);
        for _ in 0..5 {
            assert_eq!(engine.compute_signature(text), first, "text {:?}", text);
        }
    }
}

#[test]
fn signature_is_identical_across_engines() {
    let a = engine();
    let b = engine();
    assert_eq!(a.compute_signature("Hello"), b.compute_signature("Hello"));
}

#[test]
fn digital_root_is_single_digit() {
    for n in (0..100_000i64).step_by(7).chain([i64::MAX, 1, 9, 10]) {
        let root = digital_root(n).unwrap();
        assert!(root <= 9);
        if n > 0 {
            assert!(root >= 1, "n = {}", n);
        }
    }
}

#[test]
fn signature_root_is_root_of_residue() {
    let engine = engine();
    for text in ["alpha", "beta", "gamma", "delta"] {
        let sig = engine.compute_signature(text);
        assert!(sig.residue < 162);
        assert_eq!(sig.root, digital_root(sig.residue as i64).unwrap());
    }
}

#[test]
fn invalid_utf8_records_nothing() {
    let engine = engine();
    let err = engine.process_bytes(&conv("bytes"), &[0xc3, 0x28]).unwrap_err();
    assert!(err.is_input_error());
    assert_eq!(engine.aggregate_state().unwrap().total_thoughts, 0);
}

// ============================================================
// Energy
// ============================================================

#[test]
fn tiny_inputs_are_balanced() {
    let engine = engine();
    for text in ["", "a", "?", " "] {
        assert_eq!(engine.detect_energy(text), EnergyState::Balanced, "{:?}", text);
    }
}

#[test]
fn ambiguous_input_is_balanced() {
    let engine = engine();
    let text = "AMAZING!!! but ugh... I'm so tired";
    let score = engine.energy_score(text);
    assert!(score.high >= 2 && score.low >= 2, "{:?}", score);
    assert_eq!(engine.detect_energy(text), EnergyState::Balanced);
}

// ============================================================
// Process and pattern emergence
// ============================================================

#[test]
fn third_identical_message_triggers_signature_pattern() {
    let engine = engine();
    let c = conv("fresh");
    let sig = engine.compute_signature("Hello");

    assert!(engine.process(&c, "Hello").unwrap().triggered_patterns.is_empty());
    assert!(engine.process(&c, "Hello").unwrap().triggered_patterns.is_empty());

    let third = engine.process(&c, "Hello").unwrap();
    let repeats: Vec<_> = third
        .triggered_patterns
        .iter()
        .filter(|p| p.kind == PatternKind::SignatureRepetition)
        .collect();
    assert_eq!(repeats.len(), 1);
    assert_eq!(repeats[0].feature, sig.root.to_string());
    assert_eq!(repeats[0].strength, 1);

    let fourth = engine.process(&c, "Hello").unwrap();
    let repeat = fourth
        .triggered_patterns
        .iter()
        .find(|p| p.kind == PatternKind::SignatureRepetition)
        .unwrap();
    assert_eq!(repeat.strength, 2);
    assert_eq!(repeat.id, repeats[0].id);
    assert!(repeat.last_seen >= repeat.first_seen);
}

#[test]
fn hello_result_fields() {
    let engine = engine();
    let result = engine.process(&conv("c"), "Hello").unwrap();
    assert_eq!(result.ordinal, 1);
    assert_eq!(result.signature.root, 1);
    assert_eq!(result.tier, Tier::Foundation);
    assert_eq!(result.energy, EnergyState::Balanced);
    assert_eq!(result.token_budget, 369);
}

#[test]
fn low_energy_shrinks_token_budget() {
    let engine = engine();
    let result = engine.process(&conv("c"), "ugh... so tired").unwrap();
    assert_eq!(result.energy, EnergyState::Low);
    assert_eq!(result.signature.budget, 369);
    assert_eq!(result.token_budget, 200);
}

#[test]
fn empty_messages_flow_through() {
    let engine = engine();
    let c = conv("empty");
    let first = engine.process(&c, "").unwrap();
    assert_eq!(first.energy, EnergyState::Balanced);
    assert_eq!(first.tier, Tier::Foundation);
    assert!(first.triggered_patterns.is_empty());

    engine.process(&c, "").unwrap();
    let third = engine.process(&c, "").unwrap();
    let kinds: Vec<PatternKind> = third.triggered_patterns.iter().map(|p| p.kind).collect();
    assert_eq!(kinds, vec![PatternKind::SignatureRepetition, PatternKind::EnergyRepetition]);
    assert_eq!(third.triggered_patterns[0].feature, "0");
}

#[test]
fn process_twice_records_two_thoughts() {
    let engine = engine();
    let c = conv("dup");
    let a = engine.process(&c, "same text").unwrap();
    let b = engine.process(&c, "same text").unwrap();
    assert_ne!(a.thought_id, b.thought_id);
    assert_eq!(b.ordinal, a.ordinal + 1);
    assert_eq!(engine.thoughts(&c).unwrap().len(), 2);
}

#[test]
fn empty_conversation_id_is_rejected() {
    let err = engine().process(&conv("  "), "hi").unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn conversations_are_isolated_by_default() {
    let engine = engine();
    engine.process(&conv("a"), "Hello").unwrap();
    engine.process(&conv("b"), "Hello").unwrap();
    let third = engine.process(&conv("a"), "Hello").unwrap();
    assert!(third.triggered_patterns.is_empty());

    engine.process(&conv("a"), "Hello").unwrap();
    engine.process(&conv("b"), "Hello").unwrap();
    let b_third = engine.process(&conv("b"), "Hello").unwrap();
    assert!(!b_third.triggered_patterns.is_empty());
    assert!(b_third
        .triggered_patterns
        .iter()
        .all(|p| p.scope.as_ref() == Some(&conv("b"))));
}

#[test]
fn global_scope_shares_pattern_records() {
    let config = EngineConfig {
        memory: MemoryConfig { scope: PatternScope::Global, ..Default::default() },
        ..Default::default()
    };
    let engine = Engine::new(config).unwrap();
    for c in ["a", "b"] {
        for _ in 0..3 {
            engine.process(&conv(c), "Hello").unwrap();
        }
    }
    let patterns = engine.patterns(None).unwrap();
    let sig = patterns
        .iter()
        .find(|p| p.kind == PatternKind::SignatureRepetition)
        .unwrap();
    assert_eq!(sig.strength, 2);
    assert!(sig.scope.is_none());
}

#[test]
fn pattern_listing_filters_by_conversation() {
    let engine = engine();
    for c in ["a", "b"] {
        for _ in 0..3 {
            engine.process(&conv(c), "Hello").unwrap();
        }
    }
    assert_eq!(engine.patterns(None).unwrap().len(), 4);
    let only_a = engine.patterns(Some(&conv("a"))).unwrap();
    assert_eq!(only_a.len(), 2);
    assert!(only_a.windows(2).all(|w| w[0].id < w[1].id));
}

// ============================================================
// Aggregate state
// ============================================================

#[test]
fn aggregate_state_is_a_pure_read() {
    let engine = engine();
    for text in ["Hello", "Hello", "Hello", "another one"] {
        engine.process(&conv("s"), text).unwrap();
    }
    let first = engine.aggregate_state().unwrap();
    let second = engine.aggregate_state().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.total_thoughts, 4);
    assert_eq!(first.total_patterns, 2);
    assert_eq!(first.conversations, 1);
    assert_eq!(first.signature_frequency.get(&1), Some(&3));
    assert_eq!(first.energy_distribution.values().sum::<u64>(), 4);
    assert_eq!(first.tier_distribution[&Tier::Expansion], 0);
    assert_eq!(engine.pattern_count().unwrap(), first.total_patterns);
    assert_eq!(engine.conversations(), vec![conv("s")]);
    let tail: Vec<String> = engine.recent(&conv("s"), 2).unwrap().into_iter().map(|t| t.text).collect();
    assert_eq!(tail, vec!["Hello", "another one"]);
}

#[test]
fn fresh_engine_state() {
    let engine = engine();
    let state = engine.aggregate_state().unwrap();
    assert!(engine.conversations().is_empty());
    assert_eq!(engine.pattern_count().unwrap(), 0);
    assert_eq!(state.tier_distribution.len(), Tier::ALL.len());
    assert!(EnergyState::ALL.iter().all(|e| state.energy_distribution[e] == 0));
    assert_eq!(state.total_thoughts, 0);
    assert_eq!(state.total_patterns, 0);
    assert_eq!(state.stage, Stage::Neuron);
    assert_eq!(state.level, 0.0);
    assert!(state.strongest_pattern.is_none());
}

#[test]
fn stage_never_regresses() {
    let engine = engine();
    let mut previous = engine.aggregate_state().unwrap().stage;
    for i in 0..150 {
        engine.process(&conv(&format!("c{}", i % 4)), &format!("message {}", i)).unwrap();
        let stage = engine.aggregate_state().unwrap().stage;
        assert!(stage >= previous);
        previous = stage;
    }
    assert_eq!(previous, Stage::Synapse);
}

#[test]
fn strongest_pattern_is_reported() {
    let engine = engine();
    for _ in 0..6 {
        engine.process(&conv("s"), "Hello").unwrap();
    }
    let state = engine.aggregate_state().unwrap();
    let strongest = state.strongest_pattern.unwrap();
    assert_eq!(strongest.strength, 4);
    assert_eq!(strongest.kind, PatternKind::SignatureRepetition);
}

// ============================================================
// Sequence diagnostics through the engine
// ============================================================

#[test]
fn pair_round_trip() {
    let engine = engine();
    for (a, b) in [(0i64, 0i64), (3, 6), (144, 233), (1_000_000, 7)] {
        let pairs = engine.analyze_pairs(&[a, b]).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].sum, a + b);
        assert_eq!(pairs[0].digital_root, digital_root(a + b).unwrap());
    }
}

#[test]
fn fibonacci_diagnostic() {
    let report = engine().analyze_fibonacci(24).unwrap();
    assert_eq!(report.entries.len(), 24);
    // digital roots of Fibonacci numbers repeat with period 24
    let roots: Vec<u8> = report.entries.iter().map(|e| e.digital_root).collect();
    assert_eq!(&roots[..4], &[1, 1, 2, 3]);
    assert_eq!(roots[23], 9);
}

// ============================================================
// Resonance
// ============================================================

#[test]
fn resonance_matches_signatures() {
    let engine = engine();
    let report = engine.resonance("Hello", "Hello", &[]);
    assert_eq!(report.input, report.output);
    assert!((report.score - 0.3).abs() < 1e-9);
    let mastery = engine.resonance("What is a digital root?", "x", &[]);
    assert!((mastery.score - 0.4).abs() < 1e-9);
}

// ============================================================
// Journal
// ============================================================

#[test]
fn journal_restores_thoughts_and_patterns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("journal/luca.jsonl");

    {
        let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
        for _ in 0..3 {
            engine.process(&conv("persist"), "Hello").unwrap();
        }
        engine.process(&conv("other"), "Hi there").unwrap();
    }

    let entries = journal::read_entries(&path).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[2].patterns.len(), 2);

    let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
    let state = engine.aggregate_state().unwrap();
    assert_eq!(state.total_thoughts, 4);
    assert_eq!(state.total_patterns, 2);

    let next = engine.process(&conv("persist"), "Hello").unwrap();
    assert_eq!(next.ordinal, 4);
    assert_eq!(next.thought_id, 5);
    let repeat = next
        .triggered_patterns
        .iter()
        .find(|p| p.kind == PatternKind::SignatureRepetition)
        .unwrap();
    assert_eq!(repeat.strength, 2);
}

#[test]
fn missing_journal_reads_empty() {
    let dir = TempDir::new().unwrap();
    assert!(journal::read_entries(&dir.path().join("none.jsonl")).unwrap().is_empty());
}

#[test]
fn torn_journal_tail_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("luca.jsonl");
    {
        let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
        engine.process(&conv("t"), "first").unwrap();
        engine.process(&conv("t"), "second").unwrap();
    }
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{\"thought\":{\"id\":3");
    std::fs::write(&path, content).unwrap();

    assert_eq!(journal::read_entries(&path).unwrap().len(), 2);
}

fn texts(engine: &Engine, c: &str) -> Vec<String> {
    engine.thoughts(&conv(c)).unwrap().into_iter().map(|t| t.text).collect()
}

#[test]
fn restart_after_torn_tail_keeps_later_commits() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("j.jsonl");
    {
        let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
        engine.process(&conv("t"), "one").unwrap();
        engine.process(&conv("t"), "two").unwrap();
    }
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.extend_from_slice(b"{\"thought\":{\"id\":3,");
    std::fs::write(&path, bytes).unwrap();

    {
        let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
        assert_eq!(texts(&engine, "t"), vec!["one", "two"]);
        assert_eq!(engine.process(&conv("t"), "three").unwrap().ordinal, 3);
    }
    {
        let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
        assert_eq!(texts(&engine, "t"), vec!["one", "two", "three"]);
        assert_eq!(engine.process(&conv("t"), "four").unwrap().ordinal, 4);
    }
    let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
    assert_eq!(texts(&engine, "t"), vec!["one", "two", "three", "four"]);
    assert_eq!(journal::read_entries(&path).unwrap().len(), 4);
}

#[test]
fn recover_terminates_last_intact_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("j.jsonl");
    {
        let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
        engine.process(&conv("t"), "one").unwrap();
    }
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.trim_end()).unwrap();

    assert_eq!(journal::recover(&path).unwrap().len(), 1);
    assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));

    let engine = Engine::open_journal(EngineConfig::default(), &path).unwrap();
    engine.process(&conv("t"), "two").unwrap();
    assert_eq!(journal::read_entries(&path).unwrap().len(), 2);
}

#[test]
fn corrupt_journal_middle_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("luca.jsonl");
    std::fs::write(&path, "not json\n{}\n").unwrap();
    let err = journal::read_entries(&path).unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)));
}

#[test]
fn file_journal_appends_lines() {
    let dir = TempDir::new().unwrap();
    let journal = FileJournal::open(dir.path().join("j.jsonl")).unwrap();
    let engine = engine();
    let result = engine.process(&conv("j"), "Hello").unwrap();
    let thought = engine.thoughts(&conv("j")).unwrap().remove(0);
    assert_eq!(thought.id, result.thought_id);
    journal.commit(&JournalEntry { thought, patterns: vec![] }).unwrap();
    let text = std::fs::read_to_string(journal.path()).unwrap();
    assert_eq!(text.lines().count(), 1);
}

/// Journal that can be switched into a failing state.
struct FlakyJournal {
    down: AtomicBool,
}

impl Journal for FlakyJournal {
    fn commit(&self, _entry: &JournalEntry) -> luca_core::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(Error::storage_unavailable("backend offline"))
        } else {
            Ok(())
        }
    }
}

#[test]
fn failed_commit_leaves_no_partial_writes() {
    let config = EngineConfig::default();
    let flaky = Arc::new(FlakyJournal { down: AtomicBool::new(false) });
    let memory = Arc::new(PatternMemory::new(&config, flaky.clone()).unwrap());
    let engine = Engine::with_memory(config, memory).unwrap();
    let c = conv("atomic");

    for _ in 0..3 {
        engine.process(&c, "Hello").unwrap();
    }
    let before = engine.aggregate_state().unwrap();

    flaky.down.store(true, Ordering::SeqCst);
    let err = engine.process(&c, "Hello").unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)));
    assert_eq!(engine.aggregate_state().unwrap(), before);
    assert_eq!(engine.thoughts(&c).unwrap().len(), 3);

    flaky.down.store(false, Ordering::SeqCst);
    let next = engine.process(&c, "Hello").unwrap();
    assert_eq!(next.ordinal, 4);
    let repeat = next
        .triggered_patterns
        .iter()
        .find(|p| p.kind == PatternKind::SignatureRepetition)
        .unwrap();
    assert_eq!(repeat.strength, 2);
}

// ============================================================
// Concurrency
// ============================================================

#[test]
fn concurrent_processing_loses_no_updates() {
    let engine = Arc::new(engine());
    let threads = 8;
    let per_thread = 25;

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                for _ in 0..per_thread {
                    engine.process(&conv("shared"), "Hello").unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = (threads * per_thread) as u64;
    let thoughts = engine.thoughts(&conv("shared")).unwrap();
    assert_eq!(thoughts.len() as u64, total);
    let ordinals: Vec<u64> = thoughts.iter().map(|t| t.ordinal).collect();
    assert_eq!(ordinals, (1..=total).collect::<Vec<_>>());

    // every call from the third on reinforces the same record
    let patterns = engine.patterns(Some(&conv("shared"))).unwrap();
    let sig = patterns
        .iter()
        .find(|p| p.kind == PatternKind::SignatureRepetition)
        .unwrap();
    assert_eq!(sig.strength, total - 2);
}
