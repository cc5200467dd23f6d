//! CIBI balance score: how evenly production pips spread across resources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::board::{NumberToken, ResourceKind, Terrain};
use crate::constants::{CIBI_MAX, CIBI_VARIANCE_WEIGHT};
use crate::numbers::{round_f64_to_i32, usize_to_f64};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 0 (lopsided) ..= 100 (perfectly even).
    pub cibi: u8,
    /// Summed pip weight per resource; every kind is present.
    pub pip_totals: BTreeMap<ResourceKind, u32>,
}

/// Sum pip weights per resource over `(terrain, token)` pairs.
pub fn pip_totals<'a, I>(tiles: I) -> BTreeMap<ResourceKind, u32>
where
    I: IntoIterator<Item = (Terrain, Option<&'a NumberToken>)>,
{
    let mut totals: BTreeMap<ResourceKind, u32> =
        ResourceKind::ALL.into_iter().map(|kind| (kind, 0)).collect();
    for (terrain, token) in tiles {
        if let (Some(kind), Some(token)) = (terrain.resource(), token) {
            *totals.entry(kind).or_default() += u32::from(token.pip_weight);
        }
    }
    totals
}

/// `clamp(round(100 - 2 * variance), 0, 100)` over the per-resource totals,
/// using the population variance.
#[must_use]
pub fn cibi_from_totals(totals: &BTreeMap<ResourceKind, u32>) -> u8 {
    if totals.is_empty() {
        return u8::try_from(CIBI_MAX).unwrap_or(u8::MAX);
    }
    let count = usize_to_f64(totals.len());
    let mean = totals.values().map(|v| f64::from(*v)).sum::<f64>() / count;
    let variance = totals
        .values()
        .map(|v| (f64::from(*v) - mean).powi(2))
        .sum::<f64>()
        / count;
    let raw = round_f64_to_i32(f64::from(CIBI_MAX) - variance * CIBI_VARIANCE_WEIGHT);
    u8::try_from(raw.clamp(0, CIBI_MAX)).unwrap_or(0)
}

pub fn score_layout<'a, I>(tiles: I) -> ScoreResult
where
    I: IntoIterator<Item = (Terrain, Option<&'a NumberToken>)>,
{
    let pip_totals = pip_totals(tiles);
    ScoreResult {
        cibi: cibi_from_totals(&pip_totals),
        pip_totals,
    }
}
