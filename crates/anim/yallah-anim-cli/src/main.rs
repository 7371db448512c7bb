//! Main entry point for the yallah-anim CLI

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Apply(args) => commands::apply(&args, &config)?,
        Commands::DetectPose { skeleton } => commands::detect_pose(&skeleton, &config)?,
        Commands::Shift(args) => commands::shift(&args)?,
        Commands::Preset { name } => commands::preset(name.into())?,
    };
    output.emit()
}
