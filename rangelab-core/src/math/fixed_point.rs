//! Q-format constants and 256-bit helpers.
//!
//! Fee-growth counters are Q128 values stored in 256-bit words. They stay in
//! integer form until a delta has been taken; only the delta is converted to
//! floating point.

use primitive_types::U256;

/// 2^96 as f64 (exact).
pub const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0;
/// 2^128 as f64 (exact).
pub const Q128: f64 = 340_282_366_920_938_463_463_374_607_431_768_211_456.0;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Nearest f64 of a 256-bit unsigned integer.
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * TWO_POW_64 + limb as f64)
}

/// Word with the top `bits` bits set, e.g. `leading_ones(8) = 0xFF00..00`.
pub fn leading_ones(bits: u32) -> U256 {
    let mut limbs = [0u64; 4];
    let mut remaining = bits.min(256);
    // Limbs are little-endian: fill from the most significant one.
    for limb in limbs.iter_mut().rev() {
        let take = remaining.min(64);
        *limb = match take {
            0 => 0,
            64 => u64::MAX,
            n => !(u64::MAX >> n),
        };
        remaining -= take;
    }
    U256(limbs)
}

/// Parse a decimal string into a 256-bit word. Surrounding whitespace is ignored.
pub fn parse_u256(raw: &str) -> Option<U256> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(trimmed).ok()
}
