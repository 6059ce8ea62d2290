//! Driver duty logbook CLI library.
//!
//! This crate provides the CLI interface over `logbook-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, DayArgs};
pub use config::Config;
