//! Main entry point for the dow-rs CLI

mod cli;
mod commands;
mod utils;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    match cli.command {
        Commands::Chunky { command } => commands::chunky::execute(command),
        Commands::Whm { command } => commands::whm::execute(command),
        Commands::Rsh { command } => commands::rsh::execute(command),
        Commands::Wtp { command } => commands::wtp::execute(command),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
