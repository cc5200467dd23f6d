//! Seeded layout generation.
//!
//! Seed text → numeric seed → desert slots (edge tiles only) → resources →
//! rejection-sampled number tokens → CIBI score. Every step is a pure function
//! of the seed and the board configuration.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::board::{
    BoardConfig, BoardConfigError, BoardSize, NumberToken, ResourceKind, Terrain, Topology,
};
use crate::constants::{LOG_TARGET_LAYOUT, NUMBER_SEED_OFFSET, RESOURCE_SEED_OFFSET};
use crate::rules::{
    PlacementRules, PlacementViolation, RulesConfigError, check_placement, check_slot_tokens,
};
use crate::score::{ScoreResult, score_layout};
use crate::seed::SeedText;
use crate::shuffle::shuffle;

/// Errors raised before any layout work starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error(transparent)]
    Board(#[from] BoardConfigError),
    #[error(transparent)]
    Rules(#[from] RulesConfigError),
}

/// Contents of one tile slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileAssignment {
    pub slot: usize,
    pub row: u8,
    pub col: u8,
    pub terrain: Terrain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<NumberToken>,
}

/// A finished board, ready to hand to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBoard {
    /// Seed text actually used; share this to reproduce the board.
    pub seed_text: String,
    pub generated_seed_text: bool,
    pub numeric_seed: u64,
    pub board: String,
    pub tiles: Vec<TileAssignment>,
    pub score: ScoreResult,
    /// Number of token arrangements tried.
    pub attempts: u32,
    /// False when the retry budget ran out and the last candidate was kept.
    pub placement_satisfied: bool,
}

impl GeneratedBoard {
    #[must_use]
    pub const fn cibi(&self) -> u8 {
        self.score.cibi
    }

    #[must_use]
    pub const fn pip_totals(&self) -> &BTreeMap<ResourceKind, u32> {
        &self.score.pip_totals
    }

    #[must_use]
    pub fn desert_slots(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .filter(|tile| tile.terrain.is_desert())
            .map(|tile| tile.slot)
            .collect()
    }

    /// Re-run the placement rules over the final board.
    ///
    /// # Errors
    ///
    /// Returns the first violation; only possible when
    /// `placement_satisfied` is false.
    pub fn check_placement(
        &self,
        topology: &Topology,
        rules: &PlacementRules,
    ) -> Result<(), PlacementViolation> {
        let by_slot: Vec<Option<&NumberToken>> =
            self.tiles.iter().map(|tile| tile.token.as_ref()).collect();
        check_slot_tokens(&by_slot, topology, rules)
    }

    /// xxHash64 of the canonical JSON form; equal boards share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&canonical);
        hasher.finish()
    }
}

/// Generates layouts for one validated board configuration.
#[derive(Debug, Clone)]
pub struct LayoutGenerator {
    config: BoardConfig,
    topology: Topology,
    rules: PlacementRules,
}

impl LayoutGenerator {
    /// # Errors
    ///
    /// Fails fast when the board or the rules violate their invariants.
    pub fn new(config: BoardConfig, rules: PlacementRules) -> Result<Self, LayoutError> {
        config.validate()?;
        rules.validate()?;
        Ok(Self::from_parts(config, rules))
    }

    /// Generator for a built-in preset with default rules.
    #[must_use]
    pub fn for_size(size: BoardSize) -> Self {
        // Presets and default rules are checked by unit tests.
        Self::from_parts(size.config().clone(), PlacementRules::default())
    }

    fn from_parts(config: BoardConfig, rules: PlacementRules) -> Self {
        let topology = Topology::from_tiles(&config.tiles);
        Self {
            config,
            topology,
            rules,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub const fn rules(&self) -> &PlacementRules {
        &self.rules
    }

    /// Generate from optional seed text; blank or missing text draws a
    /// friendly name first.
    #[must_use]
    pub fn generate(&self, seed_text: Option<&str>) -> GeneratedBoard {
        self.generate_from(SeedText::resolve(seed_text))
    }

    #[must_use]
    pub fn generate_from(&self, seed_text: SeedText) -> GeneratedBoard {
        let seed = seed_text.numeric_seed();
        let slot_count = self.config.tile_count();

        let deserts: Vec<usize> = shuffle(self.topology.edge_slots(), seed)
            .into_iter()
            .take(self.config.desert_count)
            .collect();
        let producing: Vec<usize> = (0..slot_count)
            .filter(|slot| !deserts.contains(slot))
            .collect();

        let resources = shuffle(
            &self.config.resource_pool(),
            seed.wrapping_add(RESOURCE_SEED_OFFSET),
        );
        let mut terrain = vec![Terrain::Desert; slot_count];
        for (slot, kind) in producing.iter().zip(resources) {
            terrain[*slot] = Terrain::from(kind);
        }

        let placement = self.place_numbers(seed, &producing);
        let mut tokens: Vec<Option<NumberToken>> = vec![None; slot_count];
        for (slot, token) in producing.iter().zip(placement.tokens) {
            tokens[*slot] = Some(token);
        }

        let tiles: Vec<TileAssignment> = self
            .config
            .tiles
            .iter()
            .zip(terrain.into_iter().zip(tokens))
            .enumerate()
            .map(|(slot, (pos, (terrain, token)))| TileAssignment {
                slot,
                row: pos.row,
                col: pos.col,
                terrain,
                token,
            })
            .collect();
        let score = score_layout(tiles.iter().map(|tile| (tile.terrain, tile.token.as_ref())));

        debug!(
            target: LOG_TARGET_LAYOUT,
            "board '{}' seed '{}' ({seed}): {} attempts, satisfied {}, cibi {}",
            self.config.name,
            seed_text.text,
            placement.attempts,
            placement.satisfied,
            score.cibi
        );

        GeneratedBoard {
            seed_text: seed_text.text,
            generated_seed_text: seed_text.generated,
            numeric_seed: seed,
            board: self.config.name.clone(),
            tiles,
            score,
            attempts: placement.attempts,
            placement_satisfied: placement.satisfied,
        }
    }

    /// Shuffle tokens with `seed + 1000 + attempt` until the rules pass or the
    /// budget runs out, in which case the last candidate is kept.
    fn place_numbers(&self, seed: u64, producing: &[usize]) -> NumberPlacement {
        let base = seed.wrapping_add(NUMBER_SEED_OFFSET);
        let mut candidate = Vec::new();
        for attempt in 0..self.rules.retry_budget {
            candidate = shuffle(&self.config.tokens, base.wrapping_add(u64::from(attempt)));
            match check_placement(&candidate, producing, &self.topology, &self.rules) {
                Ok(()) => {
                    return NumberPlacement {
                        tokens: candidate,
                        attempts: attempt + 1,
                        satisfied: true,
                    };
                }
                Err(violation) => {
                    trace!(target: LOG_TARGET_LAYOUT, "attempt {attempt} rejected: {violation}");
                }
            }
        }
        warn!(
            target: LOG_TARGET_LAYOUT,
            "retry budget of {} exhausted for seed {seed}; keeping last arrangement",
            self.rules.retry_budget
        );
        NumberPlacement {
            tokens: candidate,
            attempts: self.rules.retry_budget,
            satisfied: false,
        }
    }
}

struct NumberPlacement {
    tokens: Vec<NumberToken>,
    attempts: u32,
    satisfied: bool,
}

/// Generate a board for a built-in size with default rules.
#[must_use]
pub fn generate_layout(seed_text: Option<&str>, size: BoardSize) -> GeneratedBoard {
    LayoutGenerator::for_size(size).generate(seed_text)
}

/// Like [`generate_layout`] with the board size given as text.
///
/// # Errors
///
/// Returns [`BoardConfigError::UnknownBoardSize`] before any work is done
/// when `size` names no preset.
pub fn generate_layout_named(
    seed_text: Option<&str>,
    size: &str,
) -> Result<GeneratedBoard, LayoutError> {
    let size: BoardSize = size.parse()?;
    Ok(generate_layout(seed_text, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{TilePos, hex_rows};

    #[test]
    fn same_seed_same_board() {
        for size in BoardSize::ALL {
            let a = generate_layout(Some("Test001"), size);
            let b = generate_layout(Some("Test001"), size);
            assert_eq!(a, b);
            assert_eq!(a.fingerprint(), b.fingerprint());
            assert!(!a.generated_seed_text);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_layout(Some("alpha"), BoardSize::Standard);
        let b = generate_layout(Some("beta"), BoardSize::Standard);
        assert_ne!(a.tiles, b.tiles);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn deserts_sit_on_edges_without_tokens() {
        let generator = LayoutGenerator::for_size(BoardSize::Extended);
        for seed in ["a", "b", "c", "SwiftOtter042", "Test001"] {
            let board = generator.generate(Some(seed));
            let deserts = board.desert_slots();
            assert_eq!(deserts.len(), 2);
            for slot in deserts {
                assert!(generator.topology().is_edge(slot));
                assert!(board.tiles[slot].token.is_none());
            }
            assert!(board
                .tiles
                .iter()
                .filter(|tile| !tile.terrain.is_desert())
                .all(|tile| tile.token.is_some()));
        }
    }

    #[test]
    fn blank_seed_draws_friendly_name() {
        let board = generate_layout(Some("   "), BoardSize::Standard);
        assert!(board.generated_seed_text);
        assert!(crate::seed::is_friendly_name(&board.seed_text));
        let replay = generate_layout(Some(board.seed_text.as_str()), BoardSize::Standard);
        assert_eq!(replay.tiles, board.tiles);
        assert!(!replay.generated_seed_text);
    }

    #[test]
    fn satisfied_boards_pass_validation() {
        let generator = LayoutGenerator::for_size(BoardSize::Standard);
        let mut satisfied = 0;
        for n in 0..40 {
            let seed = format!("seed-{n}");
            let board = generator.generate(Some(seed.as_str()));
            let check = board.check_placement(generator.topology(), generator.rules());
            if board.placement_satisfied {
                satisfied += 1;
                assert!(check.is_ok());
                assert!(board.attempts >= 1 && board.attempts <= 200);
            }
        }
        assert!(satisfied > 0);
    }

    #[test]
    fn impossible_rules_fall_back_to_last_candidate() {
        // Every tile touches the other two, so two 6s can never be apart.
        let config = BoardConfig::build(
            "cramped",
            vec![
                TilePos::new(0, 0, true),
                TilePos::new(0, 1, true),
                TilePos::new(1, 0, true),
            ],
            BTreeMap::from([(ResourceKind::Wood, 2)]),
            1,
            &[6, 8],
        )
        .unwrap();
        let rules = PlacementRules {
            retry_budget: 5,
            ..PlacementRules::default()
        };
        let generator = LayoutGenerator::new(config, rules).unwrap();
        let board = generator.generate(Some("stuck"));
        assert!(!board.placement_satisfied);
        assert_eq!(board.attempts, 5);
        assert!(board
            .check_placement(generator.topology(), generator.rules())
            .is_err());
        assert_eq!(board.tiles.iter().filter(|t| t.token.is_some()).count(), 2);
        // Fallback is deterministic too.
        assert_eq!(board, generator.generate(Some("stuck")));
    }

    #[test]
    fn new_rejects_bad_config() {
        let mut config = BoardSize::Standard.config().clone();
        config.desert_count = 2;
        assert!(matches!(
            LayoutGenerator::new(config, PlacementRules::default()),
            Err(LayoutError::Board(BoardConfigError::TileCountMismatch { .. }))
        ));
        let rules = PlacementRules {
            retry_budget: 0,
            ..PlacementRules::default()
        };
        assert_eq!(
            LayoutGenerator::new(BoardSize::Standard.config().clone(), rules).unwrap_err(),
            LayoutError::Rules(RulesConfigError::ZeroRetryBudget)
        );
    }

    #[test]
    fn named_sizes_resolve_or_fail_fast() {
        let board = generate_layout_named(Some("x"), "large").unwrap();
        assert_eq!(board.tiles.len(), 30);
        assert_eq!(
            generate_layout_named(Some("x"), "tiny").unwrap_err(),
            LayoutError::Board(BoardConfigError::UnknownBoardSize("tiny".to_string()))
        );
    }

    #[test]
    fn custom_strip_board_generates() {
        let config = BoardConfig::build(
            "strip",
            hex_rows(&[(0, 0, 5)]),
            BTreeMap::from([(ResourceKind::Sheep, 3), (ResourceKind::Ore, 2)]),
            1,
            &[2, 3, 6, 11, 8],
        )
        .unwrap();
        let generator = LayoutGenerator::new(config, PlacementRules::default()).unwrap();
        let board = generator.generate(Some("strip"));
        assert_eq!(board.tiles.len(), 6);
        assert_eq!(board.pip_totals().values().sum::<u32>(), 1 + 2 + 5 + 2 + 5);
        assert_eq!(board.pip_totals()[&ResourceKind::Wood], 0);
    }
}
