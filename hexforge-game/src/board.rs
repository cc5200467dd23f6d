//! Static board description: tile positions, resource and token multisets,
//! and the adjacency graph derived from them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::{MAX_TOKEN_VALUE, MIN_TOKEN_VALUE, ROBBER_VALUE};

/// Production resource produced by a non-desert tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Wood,
    Wheat,
    Sheep,
    Ore,
    Brick,
}

impl ResourceKind {
    pub const ALL: [Self; 5] = [Self::Wood, Self::Wheat, Self::Sheep, Self::Ore, Self::Brick];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wood => "wood",
            Self::Wheat => "wheat",
            Self::Sheep => "sheep",
            Self::Ore => "ore",
            Self::Brick => "brick",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a tile slot holds once a layout is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Desert,
    Wood,
    Wheat,
    Sheep,
    Ore,
    Brick,
}

impl Terrain {
    #[must_use]
    pub const fn resource(self) -> Option<ResourceKind> {
        match self {
            Self::Desert => None,
            Self::Wood => Some(ResourceKind::Wood),
            Self::Wheat => Some(ResourceKind::Wheat),
            Self::Sheep => Some(ResourceKind::Sheep),
            Self::Ore => Some(ResourceKind::Ore),
            Self::Brick => Some(ResourceKind::Brick),
        }
    }

    #[must_use]
    pub const fn is_desert(self) -> bool {
        matches!(self, Self::Desert)
    }
}

impl From<ResourceKind> for Terrain {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Wood => Self::Wood,
            ResourceKind::Wheat => Self::Wheat,
            ResourceKind::Sheep => Self::Sheep,
            ResourceKind::Ore => Self::Ore,
            ResourceKind::Brick => Self::Brick,
        }
    }
}

/// Pip weight of a dice value: the number of two-dice combinations that roll
/// it. `None` for 7 and anything outside 2..=12.
#[must_use]
pub const fn pip_weight(value: u8) -> Option<u8> {
    if value < MIN_TOKEN_VALUE || value > MAX_TOKEN_VALUE || value == ROBBER_VALUE {
        return None;
    }
    Some(6 - ROBBER_VALUE.abs_diff(value))
}

/// Display tag for the token at `index`: `A`..`Z`, then `Za`, `Zb`, ...
#[must_use]
pub fn token_letter(index: usize) -> String {
    const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    match ALPHABET.get(index) {
        Some(letter) => char::from(*letter).to_string(),
        None => {
            let overflow = (index - ALPHABET.len()) % ALPHABET.len();
            format!("Z{}", char::from(ALPHABET[overflow].to_ascii_lowercase()))
        }
    }
}

/// A number token printed with its dice value and display letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TokenSpec")]
pub struct NumberToken {
    pub value: u8,
    pub letter: String,
    pub pip_weight: u8,
}

#[derive(Deserialize)]
struct TokenSpec {
    value: u8,
    letter: String,
}

impl TryFrom<TokenSpec> for NumberToken {
    type Error = BoardConfigError;

    fn try_from(spec: TokenSpec) -> Result<Self, Self::Error> {
        Self::new(spec.value, spec.letter)
    }
}

impl NumberToken {
    /// # Errors
    ///
    /// Returns [`BoardConfigError::InvalidTokenValue`] for 7 or values
    /// outside 2..=12.
    pub fn new(value: u8, letter: impl Into<String>) -> Result<Self, BoardConfigError> {
        let pip_weight = pip_weight(value).ok_or(BoardConfigError::InvalidTokenValue(value))?;
        Ok(Self {
            value,
            letter: letter.into(),
            pip_weight,
        })
    }

    /// Build a token set from dice values, lettering them in order.
    ///
    /// # Errors
    ///
    /// Fails on the first value that is not a legal token.
    pub fn lettered(values: &[u8]) -> Result<Vec<Self>, BoardConfigError> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| Self::new(*value, token_letter(index)))
            .collect()
    }

    #[must_use]
    pub fn is_high_frequency(&self, high_frequency_values: &[u8]) -> bool {
        high_frequency_values.contains(&self.value)
    }
}

/// One slot of the board in offset-row hex coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub row: u8,
    pub col: u8,
    #[serde(default)]
    pub is_edge: bool,
}

impl TilePos {
    #[must_use]
    pub const fn new(row: u8, col: u8, is_edge: bool) -> Self {
        Self { row, col, is_edge }
    }
}

/// Hex adjacency in offset-row coordinates.
///
/// Same row: columns differ by exactly one. Neighbouring rows: measured from
/// the upper (smaller index) row, an even upper row touches columns `col` and
/// `col - 1` below it, an odd upper row touches `col` and `col + 1`.
#[must_use]
pub fn are_adjacent(a: &TilePos, b: &TilePos) -> bool {
    let (upper, lower) = if a.row <= b.row { (a, b) } else { (b, a) };
    let upper_col = i16::from(upper.col);
    let lower_col = i16::from(lower.col);
    match lower.row - upper.row {
        0 => (upper_col - lower_col).abs() == 1,
        1 if upper.row % 2 == 0 => lower_col == upper_col || lower_col == upper_col - 1,
        1 => lower_col == upper_col || lower_col == upper_col + 1,
        _ => false,
    }
}

/// Errors raised when a board configuration violates its static invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardConfigError {
    #[error("unknown board size '{0}' (expected standard or extended)")]
    UnknownBoardSize(String),
    #[error("board has no tiles")]
    Empty,
    #[error("tile count {tiles} does not equal {resources} resources + {deserts} deserts")]
    TileCountMismatch {
        tiles: usize,
        resources: usize,
        deserts: usize,
    },
    #[error("token count {tokens} does not equal non-desert tile count {non_desert}")]
    TokenCountMismatch { tokens: usize, non_desert: usize },
    #[error("{deserts} deserts requested but only {edges} edge tiles exist")]
    DesertsExceedEdges { deserts: usize, edges: usize },
    #[error("duplicate tile position ({row}, {col})")]
    DuplicatePosition { row: u8, col: u8 },
    #[error("invalid token value {0} (must be 2-12, not 7)")]
    InvalidTokenValue(u8),
    #[error("malformed board config: {0}")]
    Parse(String),
}

/// Supported built-in board presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardSize {
    /// 19 tiles, one desert.
    Standard,
    /// 30 tiles, two deserts.
    Extended,
}

impl BoardSize {
    pub const ALL: [Self; 2] = [Self::Standard, Self::Extended];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }

    #[must_use]
    pub fn config(self) -> &'static BoardConfig {
        BoardConfig::preset(self)
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardSize {
    type Err = BoardConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "small" | "19" => Ok(Self::Standard),
            "extended" | "large" | "30" => Ok(Self::Extended),
            _ => Err(BoardConfigError::UnknownBoardSize(s.to_string())),
        }
    }
}

/// Everything needed to generate layouts for one board size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardConfig {
    pub name: String,
    pub tiles: Vec<TilePos>,
    pub resources: BTreeMap<ResourceKind, u8>,
    pub desert_count: usize,
    pub tokens: Vec<NumberToken>,
}

/// On-disk form of a board config; tokens are listed as bare dice values.
#[derive(Debug, Clone, Deserialize)]
struct BoardConfigFile {
    name: String,
    tiles: Vec<TilePos>,
    resources: BTreeMap<ResourceKind, u8>,
    desert_count: usize,
    numbers: Vec<u8>,
}

const STANDARD_ROWS: [(u8, u8, u8); 5] = [(0, 1, 3), (1, 0, 3), (2, 0, 4), (3, 0, 3), (4, 1, 3)];
const STANDARD_NUMBERS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

const EXTENDED_ROWS: [(u8, u8, u8); 7] = [
    (0, 2, 4),
    (1, 1, 4),
    (2, 1, 5),
    (3, 0, 5),
    (4, 1, 5),
    (5, 1, 4),
    (6, 2, 4),
];
const EXTENDED_NUMBERS: [u8; 28] = [
    2, 2, 3, 3, 3, 4, 4, 4, 5, 5, 5, 6, 6, 6, 8, 8, 8, 9, 9, 9, 10, 10, 10, 11, 11, 11, 12, 12,
];

/// Lay out hex rows given as `(row, first_col, last_col)`. Every tile of the
/// first and last row is an edge, as are the ends of every other row.
#[must_use]
pub fn hex_rows(rows: &[(u8, u8, u8)]) -> Vec<TilePos> {
    let last_row = rows.len().saturating_sub(1);
    rows.iter()
        .enumerate()
        .flat_map(|(index, &(row, first, last))| {
            let outer_row = index == 0 || index == last_row;
            (first..=last)
                .map(move |col| TilePos::new(row, col, outer_row || col == first || col == last))
        })
        .collect()
}

impl BoardConfig {
    /// Assemble and validate a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant (see [`BoardConfig::validate`]).
    pub fn build(
        name: impl Into<String>,
        tiles: Vec<TilePos>,
        resources: BTreeMap<ResourceKind, u8>,
        desert_count: usize,
        numbers: &[u8],
    ) -> Result<Self, BoardConfigError> {
        let config = Self {
            name: name.into(),
            tiles,
            resources,
            desert_count,
            tokens: NumberToken::lettered(numbers)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Built-in configuration for `size`, built once per process.
    #[must_use]
    pub fn preset(size: BoardSize) -> &'static Self {
        static STANDARD: OnceLock<BoardConfig> = OnceLock::new();
        static EXTENDED: OnceLock<BoardConfig> = OnceLock::new();
        match size {
            BoardSize::Standard => STANDARD.get_or_init(|| {
                Self::preset_unchecked(
                    "standard",
                    &STANDARD_ROWS,
                    [4, 4, 4, 3, 3],
                    1,
                    &STANDARD_NUMBERS,
                )
            }),
            BoardSize::Extended => EXTENDED.get_or_init(|| {
                Self::preset_unchecked(
                    "extended",
                    &EXTENDED_ROWS,
                    [6, 6, 6, 5, 5],
                    2,
                    &EXTENDED_NUMBERS,
                )
            }),
        }
    }

    // Preset tables are covered by `presets_validate`; only legal dice values
    // appear in them.
    fn preset_unchecked(
        name: &str,
        rows: &[(u8, u8, u8)],
        counts: [u8; 5],
        desert_count: usize,
        numbers: &[u8],
    ) -> Self {
        let tokens = numbers
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                pip_weight(*value).map(|pip_weight| NumberToken {
                    value: *value,
                    letter: token_letter(index),
                    pip_weight,
                })
            })
            .collect();
        Self {
            name: name.to_string(),
            tiles: hex_rows(rows),
            resources: ResourceKind::ALL.into_iter().zip(counts).collect(),
            desert_count,
            tokens,
        }
    }

    /// Parse a JSON board description and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardConfigError::Parse`] for malformed JSON, or the first
    /// violated invariant.
    pub fn from_json(json: &str) -> Result<Self, BoardConfigError> {
        let file: BoardConfigFile =
            serde_json::from_str(json).map_err(|err| BoardConfigError::Parse(err.to_string()))?;
        Self::build(
            file.name,
            file.tiles,
            file.resources,
            file.desert_count,
            &file.numbers,
        )
    }

    /// Check the static invariants tying tiles, resources, deserts and tokens
    /// together.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), BoardConfigError> {
        if self.tiles.is_empty() {
            return Err(BoardConfigError::Empty);
        }
        let resources = self.resource_count();
        if self.tiles.len() != resources + self.desert_count {
            return Err(BoardConfigError::TileCountMismatch {
                tiles: self.tiles.len(),
                resources,
                deserts: self.desert_count,
            });
        }
        if self.tokens.len() != resources {
            return Err(BoardConfigError::TokenCountMismatch {
                tokens: self.tokens.len(),
                non_desert: resources,
            });
        }
        let edges = self.tiles.iter().filter(|tile| tile.is_edge).count();
        if self.desert_count > edges {
            return Err(BoardConfigError::DesertsExceedEdges {
                deserts: self.desert_count,
                edges,
            });
        }
        let mut seen = HashSet::with_capacity(self.tiles.len());
        for tile in &self.tiles {
            if !seen.insert((tile.row, tile.col)) {
                return Err(BoardConfigError::DuplicatePosition {
                    row: tile.row,
                    col: tile.col,
                });
            }
        }
        if let Some(token) = self.tokens.iter().find(|t| pip_weight(t.value).is_none()) {
            return Err(BoardConfigError::InvalidTokenValue(token.value));
        }
        Ok(())
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Number of production (non-desert) tiles.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.values().map(|count| usize::from(*count)).sum()
    }

    /// Resource multiset expanded in [`ResourceKind::ALL`] order.
    #[must_use]
    pub fn resource_pool(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .flat_map(|kind| {
                let count = self.resources.get(&kind).copied().unwrap_or(0);
                std::iter::repeat_n(kind, usize::from(count))
            })
            .collect()
    }
}

/// Adjacency graph precomputed from a board's tile positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    neighbors: Vec<SmallVec<[usize; 6]>>,
    edge_slots: Vec<usize>,
}

impl Topology {
    #[must_use]
    pub fn from_tiles(tiles: &[TilePos]) -> Self {
        let neighbors = tiles
            .iter()
            .enumerate()
            .map(|(slot, tile)| {
                tiles
                    .iter()
                    .enumerate()
                    .filter(|(other, pos)| *other != slot && are_adjacent(tile, pos))
                    .map(|(other, _)| other)
                    .collect()
            })
            .collect();
        let edge_slots = tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_edge)
            .map(|(slot, _)| slot)
            .collect();
        Self {
            neighbors,
            edge_slots,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Slots adjacent to `slot`, ascending. Empty for out-of-range slots.
    #[must_use]
    pub fn neighbors(&self, slot: usize) -> &[usize] {
        self.neighbors
            .get(slot)
            .map(SmallVec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Edge slot indices in ascending order.
    #[must_use]
    pub fn edge_slots(&self) -> &[usize] {
        &self.edge_slots
    }

    #[must_use]
    pub fn is_edge(&self, slot: usize) -> bool {
        self.edge_slots.binary_search(&slot).is_ok()
    }
}
