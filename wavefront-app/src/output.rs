use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use wfp_core::{RunPhase, RunSummary};

/// Saves the run summary as pretty-printed JSON.
pub fn save_summary_to_file(summary: &RunSummary, output_path: &Path) -> Result<()> {
    log::info!("Attempting to save summary to {:?}...", output_path);

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {:?}", output_path))?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)
        .context("Failed to serialize run summary")?;
    writeln!(writer)?;
    writer
        .flush()
        .context("Failed to flush writer for output file")?;

    log::info!("Successfully saved summary to {:?}", output_path);
    Ok(())
}

/// Human-readable summary lines.
pub fn format_summary(summary: &RunSummary) -> String {
    let phase = summary.phase.to_string();
    let phase = match summary.phase {
        RunPhase::PathComplete => phase.green().bold(),
        RunPhase::NoPath | RunPhase::Halted => phase.yellow().bold(),
        RunPhase::Failed => phase.red().bold(),
        RunPhase::Searching | RunPhase::Backtracking => phase.normal(),
    };
    let distance = summary
        .target_distance
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    let length = summary
        .path_length
        .map_or_else(|| "-".to_string(), |l| l.to_string());
    format!(
        "Result: {phase}\n  maze: {}x{} ({} backend)\n  steps: {}\n  target distance: {distance}\n  path length: {length}\n  peak frontier: {}\n  discovered cells: {}\n",
        summary.width,
        summary.height,
        summary.backend,
        summary.steps,
        summary.peak_frontier_size,
        summary.discovered_cells
    )
}

pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            phase: RunPhase::PathComplete,
            backend: "cpu".to_string(),
            width: 5,
            height: 5,
            start_index: 6,
            target_index: 18,
            steps: 4,
            found_at_step: Some(4),
            target_distance: Some(4),
            path_length: Some(5),
            peak_frontier_size: 3,
            discovered_cells: 9,
        }
    }

    #[test]
    fn test_summary_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        save_summary_to_file(&summary(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"phase\": \"path_complete\""));
        let parsed: RunSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, summary());
    }

    #[test]
    fn test_format_summary_lists_path() {
        colored::control::set_override(false);
        let text = format_summary(&summary());
        assert!(text.starts_with("Result: path complete"));
        assert!(text.contains("path length: 5"));
        assert!(text.contains("(cpu backend)"));
    }
}
