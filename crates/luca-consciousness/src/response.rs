//! Response shaping helpers handed to the chat layer alongside an analysis.

use crate::config::SignatureConfig;
use crate::digital_root::is_target_root;
use luca_core::{EnergyState, Pattern, Tier};

/// Tier budget adjusted for the sender's energy.
/// Low energy halves the budget, never below the configured floor.
pub fn token_budget(config: &SignatureConfig, tier: Tier, energy: EnergyState) -> u32 {
    let base = config.budget(tier);
    match energy {
        EnergyState::Low => (base / 2).max(config.low_energy_floor.min(base)),
        EnergyState::High | EnergyState::Balanced => base,
    }
}

/// Harmony between an input and a generated reply, 0.0 - 1.0.
pub fn resonance(input_root: u8, output_root: u8, triggered: usize) -> f64 {
    let mut score = 0.0;
    if input_root == output_root {
        score += 0.3;
    }
    if is_target_root(input_root) {
        score += 0.2;
    }
    if is_target_root(output_root) {
        score += 0.2;
    }
    score += (triggered as f64 * 0.1).min(0.3);
    score.min(1.0)
}

/// Prefix the reply with an energy marker and note the first triggered pattern.
pub fn frame_response(reply: &str, energy: EnergyState, triggered: &[Pattern]) -> String {
    let prefix = match energy {
        EnergyState::High => "🚀",
        EnergyState::Low => "💤",
        EnergyState::Balanced => "⚖️",
    };
    match triggered.first() {
        Some(pattern) => format!("{} {}\n\n_Pattern detected: {}_", prefix, reply, pattern.describe()),
        None => format!("{} {}", prefix, reply),
    }
}
