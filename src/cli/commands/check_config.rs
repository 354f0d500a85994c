use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

#[derive(Args)]
pub struct CheckConfigCommands {}

/// Print the effective configuration status; fails when directory settings are incomplete
pub fn check_config_command(
    _cmd: CheckConfigCommands,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<()> {
    let source = match config_path {
        Some(path) => path.display().to_string(),
        None => Config::get_config_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "<unknown>".to_string()),
    };

    println!();
    println!("  {}", "Instance health check configuration".bright_blue().bold());
    println!("    {}: {}", "File".dimmed(), source.cyan());
    println!(
        "    {}: {}",
        "Tenants URL".dimmed(),
        config.admin_api.tenants_url.white()
    );
    println!(
        "    {}: {} retries, {}ms starting delay{}, {}s timeout",
        "Transport".dimmed(),
        config.app.max_retry_attempts,
        config.app.retry_starting_delay_ms,
        if config.app.retry_jitter { " with jitter" } else { "" },
        config.app.timeout_secs
    );
    println!("    {}: {:?}", "Report policy".dimmed(), config.app.report_policy);

    if config.ods_api.endpoints.is_empty() {
        println!("    {}", "No endpoints configured; nothing will be probed".bright_yellow());
    } else {
        println!(
            "    {}: {}",
            "Endpoints".dimmed(),
            config.ods_api.endpoints.join(", ").white()
        );
    }

    let missing = config.admin_api.missing_fields();
    println!();
    if missing.is_empty() {
        println!("  {}", "✓ Admin API settings complete".bright_green().bold());
        Ok(())
    } else {
        println!(
            "  {} {}",
            "✗ Missing admin API settings:".bright_red().bold(),
            missing.join(", ").red()
        );
        anyhow::bail!("{} admin API setting(s) missing", missing.len())
    }
}
