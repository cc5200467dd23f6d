//! Stateless seed → `[0, 1)` mapping used by every shuffle.
//!
//! Each call is a pure function of its input, so callers derive a fresh
//! sample by offsetting the seed (`seed + i`) rather than advancing a
//! generator. The mix is integer-only which keeps results bit-identical on
//! every platform.

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const MIX_MUL_A: u64 = 0xBF58_476D_1CE4_E5B9;
const MIX_MUL_B: u64 = 0x94D0_49BB_1331_11EB;
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// SplitMix64 finaliser.
#[must_use]
pub const fn mix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(MIX_MUL_A);
    z = (z ^ (z >> 27)).wrapping_mul(MIX_MUL_B);
    z ^ (z >> 31)
}

/// Map a seed to a float in `[0, 1)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn unit_from_seed(seed: u64) -> f64 {
    // 53 significant bits fit an f64 mantissa exactly.
    (mix64(seed) >> 11) as f64 * UNIT_SCALE
}
