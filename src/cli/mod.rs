//! CLI module for launchspec - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
