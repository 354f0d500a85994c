pub mod admin;
pub mod api;
pub mod cli;
pub mod config;
pub mod ods;
pub mod runner;
