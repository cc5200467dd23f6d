//! Centralized tuning constants for board generation.
//!
//! These values define the deterministic math behind every layout. Keeping
//! them together means balance can only be adjusted via reviewed code
//! changes; `PlacementRules` takes its defaults from here.

// Seed derivation ----------------------------------------------------------
/// Offset added to the base seed before shuffling the resource multiset.
pub const RESOURCE_SEED_OFFSET: u64 = 500;
/// Offset added to the base seed before the first number-token shuffle.
pub const NUMBER_SEED_OFFSET: u64 = 1_000;

// Placement rules ----------------------------------------------------------
/// Number of number-token arrangements tried before the fallback applies.
pub const DEFAULT_RETRY_BUDGET: u32 = 200;
/// Tokens at or above this pip weight count as "high pip".
pub const HIGH_PIP_THRESHOLD: u8 = 4;
/// A tile may border at most this many high-pip tiles.
pub const MAX_HIGH_PIP_NEIGHBORS: usize = 2;
/// Dice values that must never sit next to each other.
pub const HIGH_FREQUENCY_VALUES: [u8; 2] = [6, 8];

// Token values -------------------------------------------------------------
pub const MIN_TOKEN_VALUE: u8 = 2;
pub const MAX_TOKEN_VALUE: u8 = 12;
/// The robber roll; never printed on a token.
pub const ROBBER_VALUE: u8 = 7;

// Balance score ------------------------------------------------------------
pub const CIBI_MAX: i32 = 100;
pub const CIBI_VARIANCE_WEIGHT: f64 = 2.0;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_LAYOUT: &str = "hexforge::layout";
pub(crate) const LOG_TARGET_RULES: &str = "hexforge::rules";
