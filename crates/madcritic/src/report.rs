use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use madcritic_eval::{read_run, EvalSummary};

pub fn handle_report_command(
    run_file: &Path,
    stalemate_gap: Option<f64>,
    json_output: bool,
) -> Result<()> {
    let run = read_run(run_file)?;

    let gap = stalemate_gap
        .or_else(|| run.end.as_ref().map(|e| e.summary.stalemate_gap))
        .unwrap_or(1.0);
    let summary = EvalSummary::from_outcomes(&run.outcomes, gap);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}  {}", "Run:".dimmed(), run.id);
    println!("{}  {}", "Dataset:".dimmed(), run.start.dataset);
    println!(
        "{}  {}",
        "Started:".dimmed(),
        run.start.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    match run.end {
        Some(ref end) if end.interrupted => {
            println!("{}  {}", "Status:".dimmed(), "interrupted".yellow())
        }
        Some(ref end) => println!(
            "{}  finished in {}",
            "Status:".dimmed(),
            format_duration(end.duration_secs)
        ),
        None => println!("{}  {}", "Status:".dimmed(), "incomplete".red()),
    }
    if run.outcomes.len() < run.start.questions {
        println!(
            "{}  {} of {} questions recorded",
            "Note:".dimmed(),
            run.outcomes.len(),
            run.start.questions
        );
    }
    println!();
    summary.print_summary();
    Ok(())
}

fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.0}s", secs)
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = (secs % 60.0) as u64;
        format!("{}m {}s", mins, remaining_secs)
    }
}
