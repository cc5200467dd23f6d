use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use hexforge_game::{GeneratedBoard, ResourceKind, Terrain, TileAssignment};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

const CELL_WIDTH: usize = 8;

fn terrain_code(terrain: Terrain) -> &'static str {
    match terrain {
        Terrain::Desert => "DE",
        Terrain::Wood => "WO",
        Terrain::Wheat => "WH",
        Terrain::Sheep => "SH",
        Terrain::Ore => "OR",
        Terrain::Brick => "BR",
    }
}

fn tile_cell(tile: &TileAssignment) -> String {
    let number = tile
        .token
        .as_ref()
        .map_or_else(|| "--".to_string(), |token| token.value.to_string());
    format!("[{} {number:>2}]", terrain_code(tile.terrain))
}

/// Plain-text map of the board, one line per row. Odd rows are shifted half
/// a cell right so each tile sits over the two lower tiles it borders.
#[must_use]
pub fn render_board_map(board: &GeneratedBoard) -> Vec<String> {
    let mut rows: BTreeMap<u8, Vec<&TileAssignment>> = BTreeMap::new();
    for tile in &board.tiles {
        rows.entry(tile.row).or_default().push(tile);
    }
    let min_col = board.tiles.iter().map(|tile| tile.col).min().unwrap_or(0);

    rows.into_iter()
        .map(|(row, mut tiles)| {
            tiles.sort_by_key(|tile| tile.col);
            let mut line = if row % 2 == 1 {
                " ".repeat(CELL_WIDTH / 2)
            } else {
                String::new()
            };
            let mut next_col = min_col;
            for tile in tiles {
                let gap = usize::from(tile.col.saturating_sub(next_col));
                line.push_str(&" ".repeat(gap * CELL_WIDTH));
                line.push_str(&tile_cell(tile));
                line.push(' ');
                next_col = tile.col.saturating_add(1);
            }
            line.trim_end().to_string()
        })
        .collect()
}

fn format_totals(totals: &BTreeMap<ResourceKind, u32>) -> String {
    totals
        .iter()
        .map(|(kind, pips)| format!("{kind} {pips}"))
        .collect::<Vec<_>>()
        .join(" · ")
}

pub fn generate_board_console_report(
    out: &mut dyn Write,
    boards: &[GeneratedBoard],
) -> Result<()> {
    for board in boards {
        let origin = if board.generated_seed_text {
            " (generated)"
        } else {
            ""
        };
        writeln!(
            out,
            "{} {}{origin} on {}",
            "🎲 Seed".bright_cyan().bold(),
            board.seed_text.bold(),
            board.board
        )?;
        writeln!(out)?;
        for line in render_board_map(board) {
            writeln!(out, "  {line}")?;
        }
        writeln!(out)?;

        let cibi = board.cibi().to_string();
        let cibi = match board.cibi() {
            80.. => cibi.green(),
            50..=79 => cibi.yellow(),
            _ => cibi.red(),
        };
        writeln!(out, "   CIBI: {cibi}")?;
        writeln!(out, "   Pips: {}", format_totals(board.pip_totals()))?;
        if board.placement_satisfied {
            writeln!(out, "   Placement: ok after {} attempt(s)", board.attempts)?;
        } else {
            writeln!(
                out,
                "   Placement: {} after {} attempts, showing last arrangement",
                "rules not met".yellow(),
                board.attempts
            )?;
        }
        writeln!(out, "   Fingerprint: {:016x}", board.fingerprint())?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_board_json_report(out: &mut dyn Write, boards: &[GeneratedBoard]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(boards)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_board_markdown_report(
    out: &mut dyn Write,
    boards: &[GeneratedBoard],
) -> Result<()> {
    writeln!(out, "# Hexforge Boards\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "| Seed | Board | CIBI | Attempts | Rules met |")?;
    writeln!(out, "|------|-------|------|----------|-----------|")?;
    for board in boards {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            board.seed_text,
            board.board,
            board.cibi(),
            board.attempts,
            if board.placement_satisfied { "yes" } else { "no" }
        )?;
    }
    for board in boards {
        writeln!(out, "\n## {}\n", board.seed_text)?;
        writeln!(out, "```text")?;
        for line in render_board_map(board) {
            writeln!(out, "{line}")?;
        }
        writeln!(out, "```\n")?;
        writeln!(out, "- **Pips**: {}", format_totals(board.pip_totals()))?;
    }
    Ok(())
}

/// One line per board: seed, score, and pip totals in resource order.
pub fn generate_csv_report(out: &mut dyn Write, boards: &[GeneratedBoard]) -> Result<()> {
    let resource_headers = ResourceKind::ALL
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(
        out,
        "seed,board,numeric_seed,cibi,attempts,placement_satisfied,{resource_headers},fingerprint"
    )?;
    for board in boards {
        let pips = ResourceKind::ALL
            .iter()
            .map(|kind| {
                board
                    .pip_totals()
                    .get(kind)
                    .copied()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(",");
        writeln!(
            out,
            "{},{},{},{},{},{},{pips},{:016x}",
            csv_field(&board.seed_text),
            csv_field(&board.board),
            board.numeric_seed,
            board.cibi(),
            board.attempts,
            board.placement_satisfied,
            board.fingerprint()
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Audit Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    #[allow(clippy::cast_precision_loss)]
    let success_rate = if total_tests == 0 {
        0.0
    } else {
        (passed_tests as f64 / total_tests as f64) * 100.0
    };
    writeln!(out, "Success rate: {success_rate:.1}%")?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            out,
            "   Seeds: {}/{} successful",
            result.successful_seeds, result.seeds_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Hexforge Audit Results\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}\n")?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {}\n", status, result.scenario_name)?;
        writeln!(
            out,
            "- **Seeds**: {}/{} successful",
            result.successful_seeds, result.seeds_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexforge_game::{BoardSize, LayoutGenerator, generate_layout};

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let mut buffer: Vec<u8> = Vec::new();
        let out: &mut dyn Write = &mut buffer;
        write(out).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "determinism".to_string(),
            passed,
            seeds_run: 2,
            successful_seeds: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["seed 'x': regenerating produced a different board".to_string()]
            },
            average_duration: Duration::from_micros(40),
            performance_data: vec![Duration::from_micros(40)],
        }
    }

    #[test]
    fn board_map_has_one_line_per_row() {
        let board = generate_layout(Some("Test001"), BoardSize::Standard);
        let map = render_board_map(&board);
        assert_eq!(map.len(), 5);
        let cells: usize = map.iter().map(|line| line.matches('[').count()).sum();
        assert_eq!(cells, 19);
        assert_eq!(map.iter().filter(|line| line.contains("DE --")).count(), 1);
        // Row 0 is even and starts at column 1; row 1 is odd and starts at 0.
        assert!(map[0].starts_with(&format!("{}[", " ".repeat(CELL_WIDTH))));
        assert!(map[1].starts_with(&format!("{}[", " ".repeat(CELL_WIDTH / 2))));
        assert!(map[2].starts_with('['));
    }

    #[test]
    fn drawn_tiles_overlap_exactly_their_lower_neighbours() {
        for size in BoardSize::ALL {
            let generator = LayoutGenerator::for_size(size);
            let board = generator.generate(Some("Test001"));
            let map = render_board_map(&board);
            let cell_len = tile_cell(&board.tiles[0]).len();

            // Cells are drawn in slot order: row by row, left to right.
            let mut spans: Vec<(u8, usize)> = Vec::new();
            for (row, line) in map.iter().enumerate() {
                let row = u8::try_from(row).unwrap();
                spans.extend(line.match_indices('[').map(|(start, _)| (row, start)));
            }
            assert_eq!(spans.len(), board.tiles.len());

            for (slot, &(row, start)) in spans.iter().enumerate() {
                assert_eq!(board.tiles[slot].row, row, "{size} slot {slot}");
                let drawn_below: Vec<usize> = spans
                    .iter()
                    .enumerate()
                    .filter(|(_, (other_row, other_start))| {
                        *other_row == row + 1
                            && *other_start < start + cell_len
                            && start < *other_start + cell_len
                    })
                    .map(|(other, _)| other)
                    .collect();
                let neighbours_below: Vec<usize> = generator
                    .topology()
                    .neighbors(slot)
                    .iter()
                    .copied()
                    .filter(|other| board.tiles[*other].row == row + 1)
                    .collect();
                assert_eq!(drawn_below, neighbours_below, "{size} slot {slot}");
            }
        }
    }

    #[test]
    fn extended_map_covers_every_tile() {
        let board = generate_layout(Some("Test001"), BoardSize::Extended);
        let map = render_board_map(&board);
        assert_eq!(map.len(), 7);
        let cells: usize = map.iter().map(|line| line.matches('[').count()).sum();
        assert_eq!(cells, 30);
    }

    #[test]
    fn board_console_report_lists_score_and_pips() {
        let board = generate_layout(Some("Test001"), BoardSize::Standard);
        let text = render(|out| generate_board_console_report(out, &[board.clone()]));
        assert!(text.contains("Test001"));
        assert!(text.contains("CIBI"));
        assert!(text.contains("wood "));
        assert!(text.contains(&format!("{:016x}", board.fingerprint())));
    }

    #[test]
    fn csv_report_has_header_and_rows() {
        let boards = vec![
            generate_layout(Some("Test001"), BoardSize::Standard),
            generate_layout(Some("a,b"), BoardSize::Standard),
        ];
        let text = render(|out| generate_csv_report(out, &boards));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("seed,board,numeric_seed,cibi"));
        assert!(lines[0].contains("wood,wheat,sheep,ore,brick"));
        assert!(lines[1].starts_with("Test001,standard,"));
        assert!(lines[2].starts_with("\"a,b\",standard,"));
    }

    #[test]
    fn board_json_report_round_trips() {
        let boards = vec![generate_layout(Some("Test001"), BoardSize::Extended)];
        let text = render(|out| generate_board_json_report(out, &boards));
        let parsed: Vec<GeneratedBoard> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, boards);
    }

    #[test]
    fn markdown_reports_include_sections() {
        let boards = vec![generate_layout(Some("Test001"), BoardSize::Standard)];
        let text = render(|out| generate_board_markdown_report(out, &boards));
        assert!(text.contains("# Hexforge Boards"));
        assert!(text.contains("## Test001"));
        assert!(text.contains("```text"));

        let text = render(|out| generate_markdown_report(out, &[sample_result(false)]));
        assert!(text.contains("# Hexforge Audit Results"));
        assert!(text.contains("- **Seeds**: 1/2 successful"));
        assert!(text.contains("regenerating produced a different board"));
    }

    #[test]
    fn console_audit_report_summarises() {
        let results = vec![sample_result(true), sample_result(false)];
        let text = render(|out| generate_console_report(out, &results, Duration::from_millis(3)));
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("determinism"));
    }

    #[test]
    fn console_audit_report_handles_no_results() {
        let text = render(|out| generate_console_report(out, &[], Duration::ZERO));
        assert!(text.contains("Total scenarios: 0"));
        assert!(!text.contains("Performance Summary"));
    }

    #[test]
    fn json_audit_report_is_valid_json() {
        let text = render(|out| generate_json_report(out, &[sample_result(true)]));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["scenario_name"], "determinism");
    }
}
