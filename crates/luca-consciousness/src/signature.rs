//! Signature engine: a deterministic fingerprint of message text.
//!
//! text -> SHA-256 -> leading 64 bits -> mod modulus -> digital root -> tier -> budget.
//! The hash must not depend on process, platform or run, so the
//! repetition detector can compare signatures across time.

use crate::config::SignatureConfig;
use crate::digital_root::digital_root_u64;
use luca_core::{Error, Result, Signature, Tier};
use ring::digest;

#[derive(Debug, Clone)]
pub struct SignatureEngine {
    config: SignatureConfig,
}

impl Default for SignatureEngine {
    fn default() -> Self {
        Self::new(SignatureConfig::default())
    }
}

impl SignatureEngine {
    pub fn new(config: SignatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    pub fn compute(&self, text: &str) -> Signature {
        let hash = text_hash(text);
        let residue = hash % self.config.modulus.max(1);
        let root = digital_root_u64(residue);
        let tier = classify_root(root);
        Signature {
            hash,
            residue,
            root,
            tier,
            budget: self.config.budget(tier),
        }
    }

    /// Same as [`compute`](Self::compute) for raw bytes; rejects invalid UTF-8.
    pub fn compute_bytes(&self, bytes: &[u8]) -> Result<Signature> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::input_domain(format!("message is not valid UTF-8: {}", e)))?;
        Ok(self.compute(text))
    }
}

/// Leading 64 bits (big-endian) of the SHA-256 digest. Empty text hashes to 0.
pub fn text_hash(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let digest = digest::digest(&digest::SHA256, text.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_ref()[..8]);
    u64::from_be_bytes(head)
}

/// Roots 0, 1, 2, 4 are Foundation; 5 and 7 Expansion; 3, 6, 9 and the top root 8 Mastery.
pub fn classify_root(root: u8) -> Tier {
    match root {
        3 | 6 | 9 | 8 => Tier::Mastery,
        5 | 7 => Tier::Expansion,
        _ => Tier::Foundation,
    }
}
