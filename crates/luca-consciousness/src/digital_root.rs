//! Digital root: repeated base-10 digit summation down to a single digit.

use luca_core::{Error, Result};

/// Roots flagged by the sequence analyzer and weighted by resonance scoring.
pub const TARGET_ROOTS: [u8; 3] = [3, 6, 9];

/// Digital root of a non-negative integer. Zero maps to zero.
pub fn digital_root(n: i64) -> Result<u8> {
    if n < 0 {
        return Err(Error::input_domain(format!("digital root of negative value {}", n)));
    }
    Ok(digital_root_u64(n as u64))
}

/// Digital root of an unsigned integer; 0 for 0, otherwise 1..=9.
pub fn digital_root_u64(mut n: u64) -> u8 {
    while n >= 10 {
        let mut sum = 0;
        while n > 0 {
            sum += n % 10;
            n /= 10;
        }
        n = sum;
    }
    n as u8
}

pub fn is_target_root(root: u8) -> bool {
    TARGET_ROOTS.contains(&root)
}
