//! Run command handlers
//!
//! Handles all run-related CLI commands: submission, status, listing,
//! live watching, and report download.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;
use uuid::Uuid;
use venture_client::OrchestratorClient;
use venture_core::domain::dossier::Dossier;
use venture_core::domain::run::RunStatus;
use venture_core::dto::RunSummary;

use crate::config::Config;

/// Submit a new idea for analysis
pub async fn submit(config: &Config, idea: &str, watch_after: bool) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    let created = client.create_run(idea).await?;

    println!("{}", "Run created.".bold());
    println!("  ID:     {}", created.run_id.to_string().cyan());
    println!("  Status: {}", colorize_status(&created.status));

    if watch_after {
        println!();
        watch_run(&client, created.run_id, 2).await?;
    }

    Ok(())
}

/// Show the current state of a run
pub async fn status(config: &Config, id: &str) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);
    let run_id = parse_run_id(id)?;

    let dossier = client.get_run(run_id).await?;
    print_run_details(&dossier);

    Ok(())
}

/// List recent runs
pub async fn list(config: &Config, limit: Option<i64>) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);

    let listing = client.list_runs(limit).await?;

    if listing.runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", listing.runs.len()).bold());
        println!();
        for run in listing.runs {
            print_run_summary(&run);
        }
    }

    Ok(())
}

/// Poll a run until it reaches a terminal status
pub async fn watch(config: &Config, id: &str, interval: u64) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);
    let run_id = parse_run_id(id)?;

    watch_run(&client, run_id, interval).await
}

/// Download the markdown report
pub async fn report(config: &Config, id: &str, output: Option<PathBuf>) -> Result<()> {
    let client = OrchestratorClient::new(&config.orchestrator_url);
    let run_id = parse_run_id(id)?;

    let bytes = client.get_artifact(run_id, "report.md").await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{}", format!("Report written to {}", path.display()).green());
        }
        None => {
            let text = String::from_utf8_lossy(&bytes);
            println!("{}", text);
        }
    }

    Ok(())
}

/// Poll loop shared by `watch` and `submit --watch`
async fn watch_run(client: &OrchestratorClient, run_id: Uuid, interval: u64) -> Result<()> {
    let interval = Duration::from_secs(interval.max(1));
    let mut last_step: Option<String> = None;

    loop {
        let dossier = client.get_run(run_id).await?;

        let step = dossier.current_step.map(|s| s.to_string());
        if step != last_step {
            if let Some(step) = &step {
                println!("  {} {}", "▸".cyan(), step);
            }
            last_step = step;
        }

        if dossier.status.is_terminal() {
            println!();
            print_run_details(&dossier);
            return Ok(());
        }

        tokio::time::sleep(interval).await;
    }
}

fn parse_run_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("'{}' is not a valid run id", id))
}

/// Print a run summary line
fn print_run_summary(run: &RunSummary) {
    println!("  {} Run {}", "▸".cyan(), run.run_id.to_string().dimmed());
    println!("    Idea:    {}", truncate(&run.idea, 72));
    println!("    Status:  {}", colorize_status(&run.status));
    println!(
        "    Created: {}",
        run.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed run information
fn print_run_details(dossier: &Dossier) {
    println!("{}", "Run Details:".bold());
    println!("  ID:      {}", dossier.run_id.to_string().cyan());
    println!("  Idea:    {}", truncate(&dossier.idea, 72));
    println!("  Status:  {}", colorize_status(&dossier.status));

    if let Some(step) = dossier.current_step {
        println!("  Step:    {}", step.to_string().cyan());
    }

    println!(
        "  Created: {}",
        dossier.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated: {}",
        dossier.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(error) = &dossier.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }

    println!("\n{}", "Sections:".bold());
    let sections = [
        ("clarified_idea", dossier.clarified_idea.is_some()),
        ("market_research", dossier.market_research.is_some()),
        ("positioning", dossier.positioning.is_some()),
        ("mvp_plan", dossier.mvp_plan.is_some()),
        ("debate", dossier.debate.is_some()),
        ("finance", dossier.finance.is_some()),
        ("confidence_score", dossier.confidence_score.is_some()),
        ("final_report", dossier.final_report.is_some()),
        ("media_scan", dossier.media_scan.is_some()),
    ];
    for (name, present) in sections {
        let mark = if present { "✓".green() } else { "✗".dimmed() };
        println!("  {} {}", mark, name);
    }

    if let Some(report) = &dossier.final_report {
        let verdict = match report.recommendation {
            venture_core::domain::dossier::Recommendation::Go => "GO".green(),
            venture_core::domain::dossier::Recommendation::NoGo => "NO-GO".red(),
            venture_core::domain::dossier::Recommendation::Pivot => "PIVOT".yellow(),
        };
        println!("\n{}", "Verdict:".bold());
        println!(
            "  {} (score {:.1}/10)",
            verdict.bold(),
            report.scorecard.overall_score
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max).collect();
        format!("{}…", truncated)
    }
}

/// Colorize run status for display
fn colorize_status(status: &RunStatus) -> colored::ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        RunStatus::Queued => status_str.yellow(),
        RunStatus::Running => status_str.cyan(),
        RunStatus::Done => status_str.green(),
        RunStatus::Failed => status_str.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_id() {
        assert!(parse_run_id("not-a-uuid").is_err());
        assert!(parse_run_id("6f7c1f1e-5b2a-4b7e-9b8a-2c3d4e5f6a7b").is_ok());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789abc", 10), "0123456789…");
    }
}
