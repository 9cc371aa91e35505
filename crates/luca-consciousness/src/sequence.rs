//! Sequence analyzer: digital roots and target-set membership over integer sequences.

use crate::digital_root::{digital_root, digital_root_u64, is_target_root};
use luca_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest n for which the n-th Fibonacci number fits in an i64.
pub const MAX_FIBONACCI_TERMS: usize = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub value: i64,
    pub digital_root: u8,
    pub is_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub a: i64,
    pub b: i64,
    pub sum: i64,
    pub digital_root: u8,
    pub is_target: bool,
}

/// Per-member analysis plus summary counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceReport {
    pub entries: Vec<SequenceEntry>,
    pub target_count: usize,
    /// Share of entries whose root is in the target set, 0.0 for an empty sequence.
    pub harmony: f64,
}

impl SequenceReport {
    pub fn from_entries(entries: Vec<SequenceEntry>) -> Self {
        let target_count = entries.iter().filter(|e| e.is_target).count();
        let harmony = if entries.is_empty() {
            0.0
        } else {
            target_count as f64 / entries.len() as f64
        };
        Self { entries, target_count, harmony }
    }
}

pub fn analyze_sequence(numbers: &[i64]) -> Result<Vec<SequenceEntry>> {
    numbers
        .iter()
        .map(|&value| {
            let root = digital_root(value)?;
            Ok(SequenceEntry {
                value,
                digital_root: root,
                is_target: is_target_root(root),
            })
        })
        .collect()
}

pub fn analyze_pairs(sequence: &[i64]) -> Result<Vec<PairEntry>> {
    if let Some(bad) = sequence.iter().find(|v| **v < 0) {
        return Err(Error::input_domain(format!("negative sequence member {}", bad)));
    }
    sequence
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            let sum = a
                .checked_add(b)
                .ok_or_else(|| Error::input_domain(format!("{} + {} overflows", a, b)))?;
            let root = digital_root_u64(sum as u64);
            Ok(PairEntry {
                a,
                b,
                sum,
                digital_root: root,
                is_target: is_target_root(root),
            })
        })
        .collect()
}

/// First `n` Fibonacci numbers starting 1, 1.
pub fn fibonacci(n: usize) -> Result<Vec<i64>> {
    if n > MAX_FIBONACCI_TERMS {
        return Err(Error::input_domain(format!(
            "fibonacci length {} exceeds {}",
            n, MAX_FIBONACCI_TERMS
        )));
    }
    let mut out: Vec<i64> = Vec::with_capacity(n);
    for i in 0..n {
        let next = if i < 2 { 1 } else { out[i - 1] + out[i - 2] };
        out.push(next);
    }
    Ok(out)
}

pub fn analyze_fibonacci(n: usize) -> Result<SequenceReport> {
    let sequence = fibonacci(n)?;
    Ok(SequenceReport::from_entries(analyze_sequence(&sequence)?))
}

/// Every member is the digital root of the sum of the two before it.
pub fn is_fibonacci_like(roots: &[u8]) -> bool {
    roots.len() >= 3
        && roots
            .windows(3)
            .all(|w| digital_root_u64(w[0] as u64 + w[1] as u64) == w[2])
}
