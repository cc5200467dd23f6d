use anyhow::{Context, Result, bail};
use hexforge_game::seed::friendly_name_from_rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::HashSet;

/// Seed text used when the command line names none.
pub const DEFAULT_SEED_TEXT: &str = "Test001";

/// Upper bound on drawn names; the friendly-name space is finite.
const MAX_RANDOM_SEEDS: usize = 10_000;

/// Resolve CLI seed arguments into the seed texts to generate.
///
/// Tokens are taken verbatim except `random:N`, which requests N friendly
/// names. Those, plus the `random` extra count from `--random`, are drawn
/// from a `ChaCha20Rng` seeded with `sweep_seed`, so a sweep is reproducible.
/// Duplicates are dropped while keeping first-seen order.
pub fn resolve_seed_inputs(
    tokens: &[String],
    random: usize,
    sweep_seed: u64,
) -> Result<Vec<String>> {
    let mut explicit: Vec<String> = Vec::new();
    let mut requested = random;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some(count) = token.strip_prefix("random:") {
            let count: usize = count
                .parse()
                .with_context(|| format!("invalid random seed count in '{token}'"))?;
            requested = requested.saturating_add(count);
            continue;
        }

        explicit.push(token.clone());
    }

    if requested > MAX_RANDOM_SEEDS {
        bail!("at most {MAX_RANDOM_SEEDS} random seeds can be drawn, got {requested}");
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut resolved: Vec<String> = explicit
        .into_iter()
        .filter(|seed| seen.insert(seed.clone()))
        .collect();

    let mut rng = ChaCha20Rng::seed_from_u64(sweep_seed);
    let mut drawn = 0;
    while drawn < requested {
        let name = friendly_name_from_rng(&mut rng);
        if seen.insert(name.clone()) {
            resolved.push(name);
            drawn += 1;
        }
    }

    if resolved.is_empty() {
        resolved.push(DEFAULT_SEED_TEXT.to_string());
    }

    Ok(resolved)
}
