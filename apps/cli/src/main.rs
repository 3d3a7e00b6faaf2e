//! pfcontent CLI: run particle-flow content algorithms over event files.
//!
//! Loads events from JSON, runs the configured algorithm sequence on each,
//! and reports the resulting cluster lists.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
