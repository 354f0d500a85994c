pub mod check_config;
pub mod run;

pub use check_config::{CheckConfigCommands, check_config_command};
pub use run::{RunCommands, run_command};
