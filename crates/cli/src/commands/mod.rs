//! CLI subcommands

pub mod estimate;
pub mod models;
