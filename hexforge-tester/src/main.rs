mod common;
mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use hexforge_game::{BoardConfig, BoardSize, GeneratedBoard, LayoutGenerator, PlacementRules};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::{read_board_file, split_csv};
use logic::{AuditRunner, ScenarioResult, audit_scenarios, find_scenario, resolve_seed_inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Generate boards and print them
    Generate,
    /// Check layout properties across every seed
    Audit,
}

#[derive(Debug, Parser)]
#[command(name = "hexforge-tester", version = "0.1.0")]
#[command(about = "Generate and audit seeded Hexforge board layouts")]
struct Args {
    /// What to do with the resolved seeds
    #[arg(long, value_enum, default_value_t = RunMode::Generate)]
    mode: RunMode,

    /// Built-in board: standard (19 tiles) or extended (30 tiles)
    #[arg(long, default_value = "standard")]
    board: String,

    /// JSON board description; overrides --board
    #[arg(long)]
    board_file: Option<PathBuf>,

    /// Seed texts (comma-separated); `random:N` draws N friendly names.
    /// Without seeds, generate mode draws a fresh friendly name.
    #[arg(long)]
    seeds: Option<String>,

    /// Append N friendly-name seeds drawn from the sweep RNG
    #[arg(long, default_value_t = 0)]
    random: usize,

    /// Seed for the sweep RNG behind `random:N` and --random
    #[arg(long, default_value_t = 1337)]
    sweep_seed: u64,

    /// Audit scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all audit scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Pip weight at or above which a token counts as high-pip
    #[arg(long)]
    high_pip_threshold: Option<u8>,

    /// Most high-pip neighbours a high-pip token may have
    #[arg(long)]
    max_high_pip_neighbors: Option<usize>,

    /// Number-token arrangements to try before keeping the last one
    #[arg(long)]
    retry_budget: Option<u32>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    let generator = build_generator(&args)?;
    let boards = generate_boards(&args, &generator)?;
    let seeds: Vec<String> = boards.iter().map(|b| b.seed_text.clone()).collect();
    let results = run_audit(&args, &generator, &seeds);

    write_reports(&args, &boards, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for scenario in audit_scenarios() {
        writeln!(
            output_target.writer(),
            "  {:18} - {}",
            scenario.key,
            scenario.description
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "⬡ Hexforge Board Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for scenario in audit_scenarios() {
            if !scenarios.iter().any(|s| s == scenario.key) {
                scenarios.push(scenario.key.to_string());
            }
        }
    }
    scenarios
}

fn build_rules(args: &Args) -> PlacementRules {
    let mut rules = PlacementRules::default();
    if let Some(threshold) = args.high_pip_threshold {
        rules.high_pip_threshold = threshold;
    }
    if let Some(max) = args.max_high_pip_neighbors {
        rules.max_high_pip_neighbors = max;
    }
    if let Some(budget) = args.retry_budget {
        rules.retry_budget = budget;
    }
    rules
}

fn load_board(args: &Args) -> Result<BoardConfig> {
    if let Some(path) = &args.board_file {
        let json = read_board_file(path)?;
        let config = BoardConfig::from_json(&json)
            .with_context(|| format!("invalid board file {}", path.display()))?;
        log::info!("loaded board '{}' from {}", config.name, path.display());
        return Ok(config);
    }
    let size: BoardSize = args.board.parse()?;
    Ok(size.config().clone())
}

fn build_generator(args: &Args) -> Result<LayoutGenerator> {
    let config = load_board(args)?;
    LayoutGenerator::new(config, build_rules(args)).context("board or rules failed validation")
}

fn generate_boards(args: &Args, generator: &LayoutGenerator) -> Result<Vec<GeneratedBoard>> {
    if args.seeds.is_none() && args.random == 0 {
        return Ok(vec![generator.generate(None)]);
    }
    let tokens = split_csv(args.seeds.as_deref().unwrap_or_default());
    let seeds = resolve_seed_inputs(&tokens, args.random, args.sweep_seed)?;
    Ok(seeds
        .iter()
        .map(|seed| generator.generate(Some(seed.as_str())))
        .collect())
}

fn run_audit(args: &Args, generator: &LayoutGenerator, seeds: &[String]) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    if args.mode != RunMode::Audit {
        return results;
    }

    if args.report == "console" {
        println!("{}", "🧠 Running Audit Scenarios".bright_yellow().bold());
        println!("{}", "-".repeat(30).yellow());
    }

    let runner = AuditRunner::new(args.verbose);
    for scenario_name in expand_scenarios(&args.scenarios) {
        if let Some(scenario) = find_scenario(&scenario_name) {
            results.push(runner.run_scenario(scenario, generator, seeds));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn write_reports(
    args: &Args,
    boards: &[GeneratedBoard],
    results: &[ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match (args.mode, args.report.as_str()) {
        (_, "csv") => logic::reports::generate_csv_report(&mut output_target, boards)?,
        (RunMode::Generate, "json") => {
            logic::reports::generate_board_json_report(&mut output_target, boards)?;
        }
        (RunMode::Generate, "markdown") => {
            logic::reports::generate_board_markdown_report(&mut output_target, boards)?;
        }
        (RunMode::Generate, _) => {
            logic::reports::generate_board_console_report(&mut output_target, boards)?;
        }
        (RunMode::Audit, "json") => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        (RunMode::Audit, "markdown") => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Hexforge Audit Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        (RunMode::Audit, _) => {
            if results.is_empty() {
                writeln!(&mut output_target, "No audit scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if args.report == "console" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
