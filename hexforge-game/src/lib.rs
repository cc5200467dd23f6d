//! Hexforge board generator
//!
//! Platform-agnostic core for seeded hex-tile board layouts: seed text
//! handling, board topologies, constrained resource and number placement,
//! and the CIBI balance score. Rendering is left to the caller, which receives
//! a plain [`GeneratedBoard`].

pub mod board;
pub mod constants;
pub mod layout;
pub mod numbers;
pub mod rng;
pub mod rules;
pub mod score;
pub mod seed;
pub mod shuffle;

use thiserror::Error;

// Re-export commonly used types
pub use board::{
    BoardConfig, BoardConfigError, BoardSize, NumberToken, ResourceKind, Terrain, TilePos,
    Topology, are_adjacent, pip_weight,
};
pub use layout::{
    GeneratedBoard, LayoutError, LayoutGenerator, TileAssignment, generate_layout,
    generate_layout_named,
};
pub use rules::{
    PlacementRules, PlacementViolation, RulesConfigError, check_placement, is_valid_placement,
};
pub use score::{ScoreResult, cibi_from_totals, score_layout};
pub use seed::{SeedText, hash_to_seed, is_friendly_name, random_friendly_name};
pub use shuffle::shuffle;

/// Trait for abstracting where board configurations come from.
/// Hosts with custom topologies provide their own implementation.
pub trait BoardSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the configuration registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no board of that name exists or it cannot be read.
    fn load_board(&self, name: &str) -> Result<BoardConfig, Self::Error>;
}

/// The built-in `standard` and `extended` presets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinBoards;

impl BoardSource for BuiltinBoards {
    type Error = BoardConfigError;

    fn load_board(&self, name: &str) -> Result<BoardConfig, Self::Error> {
        let size: BoardSize = name.parse()?;
        Ok(size.config().clone())
    }
}

/// Errors surfaced by [`LayoutEngine`].
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("board source failed: {0}")]
    Source(#[source] E),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Generates boards by name through a [`BoardSource`].
#[derive(Debug, Clone)]
pub struct LayoutEngine<S>
where
    S: BoardSource,
{
    source: S,
    rules: PlacementRules,
}

impl<S> LayoutEngine<S>
where
    S: BoardSource,
{
    /// Create an engine with the provided source and placement rules
    pub const fn new(source: S, rules: PlacementRules) -> Self {
        Self { source, rules }
    }

    #[must_use]
    pub const fn rules(&self) -> &PlacementRules {
        &self.rules
    }

    /// Build a validated generator for the named board.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be loaded or fails validation.
    pub fn generator(&self, board: &str) -> Result<LayoutGenerator, EngineError<S::Error>> {
        let config = self.source.load_board(board).map_err(EngineError::Source)?;
        Ok(LayoutGenerator::new(config, self.rules.clone())?)
    }

    /// Generate one board.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be loaded or fails validation.
    pub fn generate(
        &self,
        board: &str,
        seed_text: Option<&str>,
    ) -> Result<GeneratedBoard, EngineError<S::Error>> {
        Ok(self.generator(board)?.generate(seed_text))
    }
}

impl Default for LayoutEngine<BuiltinBoards> {
    fn default() -> Self {
        Self::new(BuiltinBoards, PlacementRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default)]
    struct FixtureSource {
        boards: HashMap<String, String>,
    }

    impl BoardSource for FixtureSource {
        type Error = BoardConfigError;

        fn load_board(&self, name: &str) -> Result<BoardConfig, Self::Error> {
            let json = self
                .boards
                .get(name)
                .ok_or_else(|| BoardConfigError::UnknownBoardSize(name.to_string()))?;
            BoardConfig::from_json(json)
        }
    }

    const PAIR_JSON: &str = r#"{
        "name": "pair",
        "tiles": [
            {"row": 0, "col": 0, "is_edge": true},
            {"row": 0, "col": 1, "is_edge": true},
            {"row": 0, "col": 2, "is_edge": true}
        ],
        "resources": {"brick": 2},
        "desert_count": 1,
        "numbers": [4, 10]
    }"#;

    #[test]
    fn builtin_engine_generates_presets() {
        let engine = LayoutEngine::<BuiltinBoards>::default();
        let board = engine.generate("standard", Some("Test001")).unwrap();
        assert_eq!(board.tiles.len(), 19);
        assert_eq!(board.board, "standard");
        assert_eq!(board, generate_layout(Some("Test001"), BoardSize::Standard));
    }

    #[test]
    fn engine_reports_unknown_boards() {
        let engine = LayoutEngine::<BuiltinBoards>::default();
        let err = engine.generate("hexagonal-prime", None).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Source(BoardConfigError::UnknownBoardSize(_))
        ));
        assert!(err.to_string().contains("hexagonal-prime"));
    }

    #[test]
    fn custom_source_feeds_generator() {
        let mut source = FixtureSource::default();
        source.boards.insert("pair".to_string(), PAIR_JSON.to_string());
        let engine = LayoutEngine::new(source, PlacementRules::default());
        let board = engine.generate("pair", Some("one")).unwrap();
        assert_eq!(board.tiles.len(), 3);
        assert_eq!(board.desert_slots().len(), 1);
        assert_eq!(board.pip_totals()[&ResourceKind::Brick], 6);
        assert!(board.placement_satisfied);
    }

    #[test]
    fn engine_validates_rules() {
        let rules = PlacementRules {
            retry_budget: 0,
            ..PlacementRules::default()
        };
        let engine = LayoutEngine::new(BuiltinBoards, rules);
        assert!(matches!(
            engine.generator("extended"),
            Err(EngineError::Layout(LayoutError::Rules(
                RulesConfigError::ZeroRetryBudget
            )))
        ));
    }
}
