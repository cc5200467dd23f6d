//! Number-token placement rules and the validator that enforces them.
//!
//! Rule A: two high-frequency tokens (6 and 8 by default) never share an
//! edge. Rule B: a high-pip tile borders at most `max_high_pip_neighbors`
//! other high-pip tiles.

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{NumberToken, Topology, pip_weight};
use crate::constants::{
    DEFAULT_RETRY_BUDGET, HIGH_FREQUENCY_VALUES, HIGH_PIP_THRESHOLD, LOG_TARGET_RULES,
    MAX_HIGH_PIP_NEIGHBORS,
};

/// Tunable thresholds for token placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRules {
    #[serde(default = "PlacementRules::default_high_pip_threshold")]
    pub high_pip_threshold: u8,
    #[serde(default = "PlacementRules::default_max_high_pip_neighbors")]
    pub max_high_pip_neighbors: usize,
    #[serde(default = "PlacementRules::default_high_frequency_values")]
    pub high_frequency_values: Vec<u8>,
    /// Candidate arrangements tried before the last one is accepted as-is.
    #[serde(default = "PlacementRules::default_retry_budget")]
    pub retry_budget: u32,
}

impl PlacementRules {
    const fn default_high_pip_threshold() -> u8 {
        HIGH_PIP_THRESHOLD
    }

    const fn default_max_high_pip_neighbors() -> usize {
        MAX_HIGH_PIP_NEIGHBORS
    }

    fn default_high_frequency_values() -> Vec<u8> {
        HIGH_FREQUENCY_VALUES.to_vec()
    }

    const fn default_retry_budget() -> u32 {
        DEFAULT_RETRY_BUDGET
    }

    /// # Errors
    ///
    /// Returns a [`RulesConfigError`] when a tunable is out of range.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        if self.retry_budget == 0 {
            return Err(RulesConfigError::ZeroRetryBudget);
        }
        if !(1..=5).contains(&self.high_pip_threshold) {
            return Err(RulesConfigError::HighPipThreshold(self.high_pip_threshold));
        }
        if let Some(value) = self
            .high_frequency_values
            .iter()
            .find(|value| pip_weight(**value).is_none())
        {
            return Err(RulesConfigError::HighFrequencyValue(*value));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_high_frequency(&self, token: &NumberToken) -> bool {
        token.is_high_frequency(&self.high_frequency_values)
    }

    #[must_use]
    pub const fn is_high_pip(&self, token: &NumberToken) -> bool {
        token.pip_weight >= self.high_pip_threshold
    }
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            high_pip_threshold: Self::default_high_pip_threshold(),
            max_high_pip_neighbors: Self::default_max_high_pip_neighbors(),
            high_frequency_values: Self::default_high_frequency_values(),
            retry_budget: Self::default_retry_budget(),
        }
    }
}

/// Errors raised when placement tunables are out of range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesConfigError {
    #[error("retry budget must be at least 1")]
    ZeroRetryBudget,
    #[error("high pip threshold must be between 1 and 5 (got {0})")]
    HighPipThreshold(u8),
    #[error("high-frequency value {0} is not a legal token value")]
    HighFrequencyValue(u8),
}

/// First rule broken by a candidate arrangement.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementViolation {
    #[error("high-frequency tokens on adjacent slots {a} and {b}")]
    AdjacentHighFrequency { a: usize, b: usize },
    #[error("slot {slot} borders {neighbors} high-pip tiles")]
    HighPipCluster { slot: usize, neighbors: usize },
    #[error("{tokens} tokens given for {slots} producing slots")]
    SlotCountMismatch { tokens: usize, slots: usize },
    #[error("producing slot {slot} is not on the board")]
    UnknownSlot { slot: usize },
}

/// Check a candidate where `tokens[i]` sits on `producing_slots[i]`.
///
/// # Errors
///
/// Returns [`PlacementViolation::SlotCountMismatch`] or
/// [`PlacementViolation::UnknownSlot`] when the inputs do not describe one
/// token per board slot. Otherwise returns the first rule violation found,
/// scanning slots in ascending order with rule A before rule B.
pub fn check_placement(
    tokens: &[NumberToken],
    producing_slots: &[usize],
    topology: &Topology,
    rules: &PlacementRules,
) -> Result<(), PlacementViolation> {
    if tokens.len() != producing_slots.len() {
        return Err(PlacementViolation::SlotCountMismatch {
            tokens: tokens.len(),
            slots: producing_slots.len(),
        });
    }
    let mut by_slot: Vec<Option<&NumberToken>> = vec![None; topology.len()];
    for (token, &slot) in tokens.iter().zip(producing_slots) {
        let entry = by_slot
            .get_mut(slot)
            .ok_or(PlacementViolation::UnknownSlot { slot })?;
        *entry = Some(token);
    }
    check_slot_tokens(&by_slot, topology, rules)
}

/// Check a full slot → token mapping (`None` for deserts).
///
/// # Errors
///
/// Returns the first [`PlacementViolation`] found.
pub fn check_slot_tokens(
    by_slot: &[Option<&NumberToken>],
    topology: &Topology,
    rules: &PlacementRules,
) -> Result<(), PlacementViolation> {
    let token_at = |slot: usize| by_slot.get(slot).copied().flatten();

    for (slot, token) in by_slot.iter().enumerate() {
        let Some(token) = token else { continue };
        if !rules.is_high_frequency(token) {
            continue;
        }
        if let Some(&other) = topology
            .neighbors(slot)
            .iter()
            .find(|n| token_at(**n).is_some_and(|t| rules.is_high_frequency(t)))
        {
            let violation = PlacementViolation::AdjacentHighFrequency {
                a: slot.min(other),
                b: slot.max(other),
            };
            trace!(target: LOG_TARGET_RULES, "{violation}");
            return Err(violation);
        }
    }

    for (slot, token) in by_slot.iter().enumerate() {
        let Some(token) = token else { continue };
        if !rules.is_high_pip(token) {
            continue;
        }
        let neighbors = topology
            .neighbors(slot)
            .iter()
            .filter(|n| token_at(**n).is_some_and(|t| rules.is_high_pip(t)))
            .count();
        if neighbors > rules.max_high_pip_neighbors {
            let violation = PlacementViolation::HighPipCluster { slot, neighbors };
            trace!(target: LOG_TARGET_RULES, "{violation}");
            return Err(violation);
        }
    }

    Ok(())
}

/// Boolean form of [`check_placement`].
#[must_use]
pub fn is_valid_placement(
    tokens: &[NumberToken],
    producing_slots: &[usize],
    topology: &Topology,
    rules: &PlacementRules,
) -> bool {
    check_placement(tokens, producing_slots, topology, rules).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{TilePos, hex_rows};

    fn token(value: u8) -> NumberToken {
        NumberToken::new(value, "A").unwrap()
    }

    /// Single row of five tiles: 0-1-2-3-4.
    fn strip() -> Topology {
        Topology::from_tiles(&hex_rows(&[(0, 0, 4)]))
    }

    /// Centre (2, 2) plus its six neighbours in a 3-row patch.
    fn flower() -> (Topology, usize, Vec<usize>) {
        let tiles = vec![
            TilePos::new(1, 1, true),
            TilePos::new(1, 2, true),
            TilePos::new(2, 1, true),
            TilePos::new(2, 2, false),
            TilePos::new(2, 3, true),
            TilePos::new(3, 1, true),
            TilePos::new(3, 2, true),
        ];
        let topology = Topology::from_tiles(&tiles);
        (topology, 3, vec![0, 1, 2, 4, 5, 6])
    }

    #[test]
    fn defaults_come_from_constants() {
        let rules = PlacementRules::default();
        assert_eq!(rules.high_pip_threshold, 4);
        assert_eq!(rules.max_high_pip_neighbors, 2);
        assert_eq!(rules.high_frequency_values, vec![6, 8]);
        assert_eq!(rules.retry_budget, 200);
        rules.validate().unwrap();
    }

    #[test]
    fn rules_deserialize_with_defaults() {
        let rules: PlacementRules = serde_json::from_str(r#"{"retry_budget": 5}"#).unwrap();
        assert_eq!(rules.retry_budget, 5);
        assert_eq!(rules.high_frequency_values, vec![6, 8]);
    }

    #[test]
    fn validate_rejects_bad_tunables() {
        let rules = PlacementRules {
            retry_budget: 0,
            ..PlacementRules::default()
        };
        assert_eq!(rules.validate(), Err(RulesConfigError::ZeroRetryBudget));

        let rules = PlacementRules {
            high_frequency_values: vec![6, 7],
            ..PlacementRules::default()
        };
        assert_eq!(rules.validate(), Err(RulesConfigError::HighFrequencyValue(7)));

        let rules = PlacementRules {
            high_pip_threshold: 6,
            ..PlacementRules::default()
        };
        assert_eq!(rules.validate(), Err(RulesConfigError::HighPipThreshold(6)));
    }

    #[test]
    fn adjacent_six_and_eight_fail_rule_a() {
        let topology = strip();
        let rules = PlacementRules::default();
        let tokens = [token(6), token(8), token(2), token(3), token(4)];
        assert_eq!(
            check_placement(&tokens, &[0, 1, 2, 3, 4], &topology, &rules),
            Err(PlacementViolation::AdjacentHighFrequency { a: 0, b: 1 })
        );

        let spaced = [token(6), token(2), token(8), token(3), token(6)];
        assert!(is_valid_placement(&spaced, &[0, 1, 2, 3, 4], &topology, &rules));
    }

    #[test]
    fn desert_gap_separates_high_frequency_tokens() {
        let topology = strip();
        let rules = PlacementRules::default();
        // Slot 1 is a desert, so 6 on slot 0 and 8 on slot 2 are not adjacent.
        let tokens = [token(6), token(8), token(2), token(3)];
        assert!(is_valid_placement(&tokens, &[0, 2, 3, 4], &topology, &rules));
    }

    #[test]
    fn mismatched_inputs_are_rejected_not_truncated() {
        let topology = strip();
        let rules = PlacementRules::default();
        // Truncating to the shorter list would leave the adjacent 6 and 8 out.
        let tokens = [token(2), token(3), token(6), token(8)];
        assert_eq!(
            check_placement(&tokens, &[0, 1, 2], &topology, &rules),
            Err(PlacementViolation::SlotCountMismatch {
                tokens: 4,
                slots: 3
            })
        );
        assert_eq!(
            check_placement(&tokens[..2], &[0, 1, 2], &topology, &rules),
            Err(PlacementViolation::SlotCountMismatch {
                tokens: 2,
                slots: 3
            })
        );
        assert_eq!(
            check_placement(&tokens[..2], &[0, 9], &topology, &rules),
            Err(PlacementViolation::UnknownSlot { slot: 9 })
        );
        assert!(!is_valid_placement(&tokens, &[0, 1], &topology, &rules));
    }

    #[test]
    fn third_high_pip_neighbour_fails_rule_b() {
        let (topology, centre, ring) = flower();
        let rules = PlacementRules::default();
        // 5 and 9 are high pip but not high frequency.
        let mut tokens = vec![token(5), token(2), token(9), token(3), token(2), token(3)];
        let mut slots = ring.clone();
        tokens.push(token(4));
        slots.push(centre);
        // Centre is pip 3 -> not checked; ring tiles have <= 1 high-pip neighbour.
        assert!(is_valid_placement(&tokens, &slots, &topology, &rules));

        tokens[6] = token(5);
        // Centre now high pip with two high-pip neighbours: still fine.
        assert!(is_valid_placement(&tokens, &slots, &topology, &rules));

        tokens[3] = token(9);
        assert_eq!(
            check_placement(&tokens, &slots, &topology, &rules),
            Err(PlacementViolation::HighPipCluster {
                slot: centre,
                neighbors: 3
            })
        );
    }

    #[test]
    fn thresholds_are_tunable() {
        let (topology, centre, ring) = flower();
        let mut slots = ring;
        slots.push(centre);
        let tokens = vec![
            token(5),
            token(2),
            token(9),
            token(9),
            token(2),
            token(3),
            token(5),
        ];
        let strict = PlacementRules::default();
        assert!(!is_valid_placement(&tokens, &slots, &topology, &strict));

        let relaxed = PlacementRules {
            max_high_pip_neighbors: 3,
            ..PlacementRules::default()
        };
        assert!(is_valid_placement(&tokens, &slots, &topology, &relaxed));

        let only_six_eight = PlacementRules {
            high_pip_threshold: 5,
            ..PlacementRules::default()
        };
        assert!(is_valid_placement(&tokens, &slots, &topology, &only_six_eight));
    }
}
