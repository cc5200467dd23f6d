use anyhow::{Context, Result, ensure};
use colored::Colorize;
use hexforge_game::{
    GeneratedBoard, LayoutGenerator, ResourceKind, cibi_from_totals, hash_to_seed,
    is_friendly_name,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

type AuditCheck = fn(&LayoutGenerator, &str, &GeneratedBoard) -> Result<()>;

/// A named property checked against every generated board.
#[derive(Debug, Clone, Copy)]
pub struct AuditScenario {
    pub key: &'static str,
    pub description: &'static str,
    check: AuditCheck,
}

impl AuditScenario {
    /// Run the check for one seed and the board it produced.
    pub fn check(
        &self,
        generator: &LayoutGenerator,
        seed: &str,
        board: &GeneratedBoard,
    ) -> Result<()> {
        (self.check)(generator, seed, board)
    }
}

const SCENARIOS: [AuditScenario; 6] = [
    AuditScenario {
        key: "determinism",
        description: "Same seed text regenerates an identical board",
        check: check_determinism,
    },
    AuditScenario {
        key: "coverage",
        description: "Terrain and number tokens use each pool entry exactly once",
        check: check_coverage,
    },
    AuditScenario {
        key: "desert-on-edge",
        description: "Deserts sit on edge slots and carry no token",
        check: check_desert_on_edge,
    },
    AuditScenario {
        key: "placement-rules",
        description: "6/8 spacing and high-pip clustering hold unless flagged",
        check: check_placement_rules,
    },
    AuditScenario {
        key: "score-bounds",
        description: "CIBI stays in 0..=100 and matches the pip totals",
        check: check_score_bounds,
    },
    AuditScenario {
        key: "seed-roundtrip",
        description: "Reported seed text reproduces the board",
        check: check_seed_roundtrip,
    },
];

#[must_use]
pub const fn audit_scenarios() -> &'static [AuditScenario] {
    &SCENARIOS
}

#[must_use]
pub fn find_scenario(key: &str) -> Option<&'static AuditScenario> {
    SCENARIOS.iter().find(|scenario| scenario.key == key)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub seeds_run: usize,
    pub successful_seeds: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct AuditRunner {
    verbose: bool,
}

impl AuditRunner {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &AuditScenario,
        generator: &LayoutGenerator,
        seeds: &[String],
    ) -> ScenarioResult {
        if self.verbose {
            println!(
                "🧪 Auditing scenario: {} ({} seeds, board {})",
                scenario.key.bright_white(),
                seeds.len(),
                generator.config().name
            );
        }

        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for seed in seeds {
            let start_time = Instant::now();
            let board = generator.generate(Some(seed.as_str()));
            match scenario.check(generator, seed, &board) {
                Ok(()) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ seed '{seed}' passed ({duration:?}) cibi:{} attempts:{}",
                            board.cibi(),
                            board.attempts
                        );
                    }
                }
                Err(err) => {
                    let message = format!("seed '{seed}': {err:#}");
                    if self.verbose {
                        println!("  ❌ {}", message.clone().red());
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        log::debug!(
            "scenario {} finished: {successes}/{} seeds passed",
            scenario.key,
            seeds.len()
        );

        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            passed: failures.is_empty(),
            seeds_run: seeds.len(),
            successful_seeds: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

fn check_determinism(
    generator: &LayoutGenerator,
    seed: &str,
    board: &GeneratedBoard,
) -> Result<()> {
    let replay = generator.generate(Some(seed));
    ensure!(replay == *board, "regenerating produced a different board");
    ensure!(
        replay.fingerprint() == board.fingerprint(),
        "fingerprint drifted between runs"
    );
    Ok(())
}

fn check_coverage(
    generator: &LayoutGenerator,
    _seed: &str,
    board: &GeneratedBoard,
) -> Result<()> {
    let config = generator.config();
    ensure!(
        board.tiles.len() == config.tile_count(),
        "expected {} tiles, found {}",
        config.tile_count(),
        board.tiles.len()
    );

    let mut terrain: BTreeMap<ResourceKind, u8> = BTreeMap::new();
    for kind in board.tiles.iter().filter_map(|tile| tile.terrain.resource()) {
        *terrain.entry(kind).or_default() += 1;
    }
    let expected: BTreeMap<ResourceKind, u8> = config
        .resources
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(kind, count)| (*kind, *count))
        .collect();
    ensure!(
        terrain == expected,
        "terrain counts {terrain:?} differ from {expected:?}"
    );

    let mut placed: Vec<(u8, &str)> = board
        .tiles
        .iter()
        .filter_map(|tile| tile.token.as_ref())
        .map(|token| (token.value, token.letter.as_str()))
        .collect();
    let mut pool: Vec<(u8, &str)> = config
        .tokens
        .iter()
        .map(|token| (token.value, token.letter.as_str()))
        .collect();
    placed.sort_unstable();
    pool.sort_unstable();
    ensure!(placed == pool, "number tokens are not a permutation of the pool");

    ensure!(
        board.desert_slots().len() == config.desert_count,
        "expected {} deserts, found {}",
        config.desert_count,
        board.desert_slots().len()
    );
    Ok(())
}

fn check_desert_on_edge(
    generator: &LayoutGenerator,
    _seed: &str,
    board: &GeneratedBoard,
) -> Result<()> {
    for slot in board.desert_slots() {
        ensure!(
            generator.topology().is_edge(slot),
            "desert on interior slot {slot}"
        );
        ensure!(
            board.tiles.get(slot).is_some_and(|tile| tile.token.is_none()),
            "desert slot {slot} carries a token"
        );
    }
    ensure!(
        board
            .tiles
            .iter()
            .filter(|tile| !tile.terrain.is_desert())
            .all(|tile| tile.token.is_some()),
        "producing tile without a number token"
    );
    Ok(())
}

fn check_placement_rules(
    generator: &LayoutGenerator,
    _seed: &str,
    board: &GeneratedBoard,
) -> Result<()> {
    let rules = generator.rules();
    let verdict = board.check_placement(generator.topology(), rules);
    if board.placement_satisfied {
        verdict.context("board reported satisfied but breaks a rule")?;
        ensure!(
            (1..=rules.retry_budget).contains(&board.attempts),
            "attempt count {} outside 1..={}",
            board.attempts,
            rules.retry_budget
        );
    } else {
        // Fallback keeps the last rejected arrangement.
        ensure!(
            board.attempts == rules.retry_budget,
            "fallback after {} attempts, budget is {}",
            board.attempts,
            rules.retry_budget
        );
        ensure!(
            verdict.is_err(),
            "board flagged unsatisfied but passes every rule"
        );
    }
    Ok(())
}

fn check_score_bounds(
    _generator: &LayoutGenerator,
    _seed: &str,
    board: &GeneratedBoard,
) -> Result<()> {
    ensure!(board.cibi() <= 100, "cibi {} above 100", board.cibi());
    ensure!(
        board.pip_totals().len() == ResourceKind::ALL.len(),
        "pip totals missing a resource: {:?}",
        board.pip_totals()
    );
    ensure!(
        cibi_from_totals(board.pip_totals()) == board.cibi(),
        "cibi {} does not match its pip totals",
        board.cibi()
    );
    let token_pips: u32 = board
        .tiles
        .iter()
        .filter_map(|tile| tile.token.as_ref())
        .map(|token| u32::from(token.pip_weight))
        .sum();
    let total: u32 = board.pip_totals().values().sum();
    ensure!(
        total == token_pips,
        "pip totals sum to {total}, tokens carry {token_pips}"
    );
    Ok(())
}

fn check_seed_roundtrip(
    generator: &LayoutGenerator,
    seed: &str,
    board: &GeneratedBoard,
) -> Result<()> {
    if seed.trim().is_empty() {
        ensure!(board.generated_seed_text, "blank seed was used verbatim");
        ensure!(
            is_friendly_name(&board.seed_text),
            "generated seed '{}' is not a friendly name",
            board.seed_text
        );
    } else {
        ensure!(
            board.seed_text == seed && !board.generated_seed_text,
            "seed text reported as '{}'",
            board.seed_text
        );
    }
    ensure!(
        board.numeric_seed == hash_to_seed(&board.seed_text),
        "numeric seed {} does not match the seed text",
        board.numeric_seed
    );
    let replay = generator.generate(Some(board.seed_text.as_str()));
    ensure!(
        replay.tiles == board.tiles,
        "reported seed text does not reproduce the board"
    );
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros_vec
            .into_iter()
            .map(|m| Duration::from_micros(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
