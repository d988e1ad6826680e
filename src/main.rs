//! nplusone CLI entry point.
//!
//! Handles logger initialization, CLI argument parsing, and command
//! dispatching. The analysis itself runs on a thread with a larger
//! stack to handle deeply nested AST traversals without overflow.

use anyhow::Result;
use clap::Parser;
use nplusone::cli::{Cli, Commands, MAIN_STACK_SIZE};
use nplusone::commands::{handle_analyze_command, init_config, AnalyzeOptions};
use std::any::Any;

fn main() -> Result<()> {
    std::thread::Builder::new()
        .stack_size(MAIN_STACK_SIZE)
        .spawn(main_inner)?
        .join()
        .map_err(|e| anyhow::anyhow!("thread panic: {}", panic_message(&e)))?
}

fn main_inner() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli);

    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
            ignore,
            verbose,
        } => {
            let count = handle_analyze_command(AnalyzeOptions {
                paths,
                format,
                output,
                ignore,
                verbose,
            })?;
            if count > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Init { force } => init_config(force),
    }
}

/// Controlled by RUST_LOG; `--verbose` raises the default filter so the
/// analyzer's trace lines become visible.
fn init_logger(cli: &Cli) {
    let verbose = matches!(cli.command, Commands::Analyze { verbose: true, .. });
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
