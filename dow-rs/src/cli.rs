//! Root CLI structure for dow-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dow-rs")]
#[command(about = "Command-line tools for Dawn of War file formats", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Relic Chunky container operations
    Chunky {
        #[command(subcommand)]
        command: crate::commands::chunky::ChunkyCommands,
    },

    /// WHM/SGM model operations
    Whm {
        #[command(subcommand)]
        command: crate::commands::whm::WhmCommands,
    },

    /// RSH shader texture operations
    Rsh {
        #[command(subcommand)]
        command: crate::commands::rsh::RshCommands,
    },

    /// WTP team colour pattern operations
    Wtp {
        #[command(subcommand)]
        command: crate::commands::wtp::WtpCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
