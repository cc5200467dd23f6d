//! Seeded Fisher-Yates shuffle.

use crate::numbers::unit_to_index;
use crate::rng::unit_from_seed;

/// Return a permutation of `items` determined entirely by `seed`.
///
/// Walks `i` from the last index down to 1, swapping `i` with
/// `floor(unit_from_seed(seed + i) * (i + 1))`. The input is left untouched.
#[must_use]
pub fn shuffle<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let offset = u64::try_from(i).unwrap_or(u64::MAX);
        let j = unit_to_index(unit_from_seed(seed.wrapping_add(offset)), i + 1);
        out.swap(i, j);
    }
    out
}
