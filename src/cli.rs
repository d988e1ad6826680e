use crate::io::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stack size for the analysis thread. The default main thread stack is
/// often ~1MB, which is insufficient for recursive syn::visit patterns
/// on large or deeply nested Rust files.
pub const MAIN_STACK_SIZE: usize = 16 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "nplusone")]
#[command(about = "Static N+1 query pattern detector for ORM code", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze paths for potential N+1 query patterns
    Analyze {
        /// Paths to analyze (files or directories)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated list of file patterns to ignore
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a default .nplusone.toml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}
