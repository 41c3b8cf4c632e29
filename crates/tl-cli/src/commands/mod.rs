//! CLI subcommand implementations.

pub mod entries;
pub mod export;
pub mod groups;
pub mod import;
pub mod overlaps;
pub mod report;
pub mod status;
pub mod timer;
pub mod util;
