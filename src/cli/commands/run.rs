use crate::config::Config;
use crate::runner::{RunSummary, build_runner};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use log::info;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct RunCommands {
    /// Repeat the run every SECS seconds until interrupted
    #[arg(long, value_name = "SECS")]
    pub every: Option<u64>,
}

/// Handle run command
pub async fn run_command(cmd: RunCommands, config: &Config, cancel: CancellationToken) -> Result<()> {
    let Some(every) = cmd.every else {
        run_once(config, &cancel).await?;
        return Ok(());
    };

    if every == 0 {
        anyhow::bail!("--every must be at least 1 second");
    }

    info!("Scheduled mode: running every {}s", every);
    let mut interval = tokio::time::interval(Duration::from_secs(every));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let summary = run_once(config, &cancel).await?;
        if summary.cancelled {
            break;
        }
    }

    info!("Scheduled mode stopped");
    Ok(())
}

/// One run with freshly built clients
async fn run_once(config: &Config, cancel: &CancellationToken) -> Result<RunSummary> {
    let runner = build_runner(config)?;
    let summary = runner.run(cancel).await;
    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    let status = if summary.cancelled {
        "Cancelled".bright_yellow().bold()
    } else if summary.report_failures > 0 {
        "Completed with report failures".bright_red().bold()
    } else {
        "Completed".bright_green().bold()
    };

    println!("{} {}", status, summary.run_id.to_string().dimmed());
    println!(
        "  {}: {}  {}: {}  {}: {}",
        "Tenants".dimmed(),
        summary.tenants,
        "Instances".dimmed(),
        summary.instances,
        "Reported".dimmed(),
        summary.reported.to_string().green()
    );
    if summary.ineligible + summary.empty + summary.report_failures > 0 {
        println!(
            "  {}: {}  {}: {}  {}: {}",
            "Ineligible".dimmed(),
            summary.ineligible.to_string().yellow(),
            "Without data".dimmed(),
            summary.empty.to_string().yellow(),
            "Report failures".dimmed(),
            summary.report_failures.to_string().red()
        );
    }
}
