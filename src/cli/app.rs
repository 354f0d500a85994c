use super::commands::{CheckConfigCommands, RunCommands};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "instance-healthcheck")]
#[command(about = "Counts resources on every instance in the admin directory and reports them back")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Environment file loaded before configuration (defaults to ./.env if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Write logs to this file instead of stderr (truncated on start)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the health check once, or on a schedule
    Run(RunCommands),
    /// Validate configuration without contacting any service
    CheckConfig(CheckConfigCommands),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_every() {
        let cli = Cli::try_parse_from([
            "instance-healthcheck",
            "--config",
            "/tmp/config.toml",
            "run",
            "--every",
            "300",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
        match cli.command {
            Commands::Run(args) => assert_eq!(args.every, Some(300)),
            Commands::CheckConfig(_) => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_check_config_with_global_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["instance-healthcheck", "check-config", "--log-file", "hc.log"])
            .unwrap();

        assert_eq!(cli.log_file, Some(PathBuf::from("hc.log")));
        assert!(matches!(cli.command, Commands::CheckConfig(_)));
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
