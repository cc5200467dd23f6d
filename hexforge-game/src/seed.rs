//! Seed text handling: human-friendly names and the text → numeric hash.
//! Name format: <Adjective><Noun><NNN>, e.g. `SwiftOtter042`.
//!
//! Generated names are drawn from fresh randomness and then hashed like any
//! user-supplied text, so the name is the shareable seed rather than a second
//! encoding of a numeric one.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const ADJECTIVES: [&str; 10] = [
    "Brave", "Calm", "Clever", "Golden", "Happy", "Lucky", "Mighty", "Quiet", "Swift", "Wild",
];

pub const NOUNS: [&str; 10] = [
    "Badger", "Falcon", "Harbor", "Island", "Meadow", "Otter", "Quarry", "River", "Summit",
    "Willow",
];

const NAME_SUFFIX_DIGITS: usize = 3;
const NAME_SUFFIX_RANGE: u16 = 1_000;
const HASH_MULTIPLIER: i32 = 31;

/// Rolling 31x hash over the UTF-16 code units of `text`, wrapped to `i32`,
/// returned as its absolute value.
///
/// Case-sensitive and unnormalised: `"abc"` and `"ABC"` give different seeds.
#[must_use]
pub fn hash_to_seed(text: &str) -> u64 {
    let hash = text.encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_mul(HASH_MULTIPLIER)
            .wrapping_add(i32::from(unit))
    });
    u64::from(hash.unsigned_abs())
}

/// Build a friendly name from any RNG.
pub fn friendly_name_from_rng<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    let suffix = rng.gen_range(0..NAME_SUFFIX_RANGE);
    format!("{adjective}{noun}{suffix:0width$}", width = NAME_SUFFIX_DIGITS)
}

/// Friendly name drawn from the thread-local entropy source.
#[must_use]
pub fn random_friendly_name() -> String {
    friendly_name_from_rng(&mut rand::thread_rng())
}

/// Whether `text` has the `{Adjective}{Noun}{NNN}` shape with words from the
/// fixed vocabularies.
#[must_use]
pub fn is_friendly_name(text: &str) -> bool {
    let Some(split) = text.len().checked_sub(NAME_SUFFIX_DIGITS) else {
        return false;
    };
    if !text.is_char_boundary(split) {
        return false;
    }
    let (words, digits) = text.split_at(split);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    ADJECTIVES.iter().any(|adjective| {
        words
            .strip_prefix(adjective)
            .is_some_and(|noun| NOUNS.contains(&noun))
    })
}

/// Seed text chosen for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedText {
    pub text: String,
    /// True when no usable text was supplied and a friendly name was drawn.
    pub generated: bool,
}

impl SeedText {
    /// Use the supplied text verbatim, or draw a friendly name when it is
    /// absent, empty or whitespace-only.
    #[must_use]
    pub fn resolve(supplied: Option<&str>) -> Self {
        Self::resolve_with(supplied, random_friendly_name)
    }

    /// Like [`SeedText::resolve`] with an explicit name source.
    pub fn resolve_with(supplied: Option<&str>, fallback: impl FnOnce() -> String) -> Self {
        match supplied {
            Some(text) if !text.trim().is_empty() => Self {
                text: text.to_string(),
                generated: false,
            },
            _ => Self {
                text: fallback(),
                generated: true,
            },
        }
    }

    #[must_use]
    pub fn numeric_seed(&self) -> u64 {
        hash_to_seed(&self.text)
    }
}
