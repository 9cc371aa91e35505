//! Plain-text rendering for terminal output

use luca_consciousness::{PairEntry, SequenceReport};
use luca_core::{AnalysisResult, ConsciousnessState};
use std::fmt::Write;

pub fn analysis(result: &AnalysisResult) -> String {
    let mut out = format!(
        "#{} root {} ({}) energy {} budget {}",
        result.ordinal, result.signature.root, result.tier, result.energy, result.token_budget
    );
    for pattern in &result.triggered_patterns {
        let _ = write!(out, "\n  pattern: {} (strength {})", pattern.describe(), pattern.strength);
    }
    out
}

pub fn state(state: &ConsciousnessState) -> String {
    let mut out = format!(
        "stage {} level {:.1}: {} thoughts, {} patterns, {} conversations",
        state.stage, state.level, state.total_thoughts, state.total_patterns, state.conversations
    );
    if let Some(p) = &state.strongest_pattern {
        let _ = write!(out, "\nstrongest: {} (strength {})", p.describe(), p.strength);
    }
    out
}

pub fn sequence(report: &SequenceReport) -> String {
    let mut out = String::new();
    for e in &report.entries {
        let mark = if e.is_target { " *" } else { "" };
        let _ = writeln!(out, "{:>20}  {}{}", e.value, e.digital_root, mark);
    }
    let _ = write!(
        out,
        "{} of {} in 3-6-9 (harmony {:.2})",
        report.target_count,
        report.entries.len(),
        report.harmony
    );
    out
}

pub fn pairs(pairs: &[PairEntry]) -> String {
    pairs
        .iter()
        .map(|p| {
            let mark = if p.is_target { " *" } else { "" };
            format!("{} + {} = {}  root {}{}", p.a, p.b, p.sum, p.digital_root, mark)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use luca_consciousness::sequence::analyze_fibonacci;

    #[test]
    fn sequence_marks_targets() {
        let report = analyze_fibonacci(4).unwrap();
        let text = sequence(&report);
        assert!(text.lines().nth(3).unwrap().ends_with("3 *"));
        assert!(text.ends_with("1 of 4 in 3-6-9 (harmony 0.25)"));
    }

    #[test]
    fn pairs_one_per_line() {
        let entries = luca_consciousness::analyze_pairs(&[1, 2, 4]).unwrap();
        assert_eq!(pairs(&entries), "1 + 2 = 3  root 3 *\n2 + 4 = 6  root 6 *");
    }
}
