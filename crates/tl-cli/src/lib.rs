//! Time logger CLI library.
//!
//! This crate provides the CLI interface for the time logger.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EntryAction, ExportFormat, GroupAction, ReportScope};
pub use config::{Backend, Config};
