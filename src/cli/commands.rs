//! CLI command definitions using clap.
//!
//! - check: validate an ecosystem file
//! - show: print the resolved apps handed to the supervisor
//! - plan: print how many processes each app gets

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;

/// launchspec - validate and resolve process supervisor launch descriptors
#[derive(Parser, Debug)]
#[command(name = "launchspec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate every app in an ecosystem file
    Check {
        /// Ecosystem file (defaults to the configured default-file)
        file: Option<PathBuf>,
    },

    /// Print the resolved apps as registered with the supervisor
    Show {
        /// Ecosystem file (defaults to the configured default-file)
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print the spawn plan for each app
    Plan {
        /// Ecosystem file (defaults to the configured default-file)
        file: Option<PathBuf>,
    },
}

impl Commands {
    /// File argument given for the subcommand, if any
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            Commands::Check { file } | Commands::Show { file, .. } | Commands::Plan { file } => file.as_ref(),
        }
    }
}
