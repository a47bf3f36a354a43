//! # gfsim-cli
//!
//! The main entry point for the gfsim binary. Parses command-line arguments
//! and dispatches to the appropriate subcommand handler.

#![forbid(unsafe_code)]

use crate::args::{Cli, Command};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod loader;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    match args.command {
        Command::Run(opts) => commands::run::exec(opts),
        Command::Dataset(opts) => commands::dataset::exec(opts),
        Command::Merge(opts) => commands::merge::exec(opts),
        Command::Validate(opts) => commands::validate::exec(opts),
    }
}
