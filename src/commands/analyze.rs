//! The analyze command: the host driver that loads sources from disk,
//! seeds configuration, runs the detection pass, and writes findings.

use crate::analyzers::analyze_sources;
use crate::config::{self, Config};
use crate::io::output::{write_findings, OutputFormat};
use crate::io::walker::find_source_files;
use anyhow::{Context, Result};
use std::fs;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub ignore: Vec<String>,
    pub verbose: bool,
}

/// Run the analysis; returns the number of findings reported.
pub fn handle_analyze_command(options: AnalyzeOptions) -> Result<usize> {
    let config = resolve_config(&options)?;
    // Seed the process-wide configuration; first caller wins.
    config::set_config(config.clone());

    // Ignored files are still loaded: their functions feed the call
    // graph, and only the loop collector exempts them.
    let sources = load_sources(&options.paths)?;
    log::debug!("loaded {} source file(s)", sources.len());

    let analysis = analyze_sources(&sources, &config)?;

    match &options.output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_findings(
                &mut file,
                &analysis.findings,
                &analysis.file_set,
                options.format,
                false,
            )?;
        }
        None => {
            let stdout = std::io::stdout();
            let color =
                options.format == OutputFormat::Terminal && stdout.is_terminal();
            let mut lock = stdout.lock();
            write_findings(
                &mut lock,
                &analysis.findings,
                &analysis.file_set,
                options.format,
                color,
            )?;
            lock.flush()?;
        }
    }

    Ok(analysis.findings.len())
}

/// Merge the on-disk configuration (if any) with the command line:
/// CLI ignore patterns extend the file's, and verbosity is sticky.
fn resolve_config(options: &AnalyzeOptions) -> Result<Config> {
    let root = config_root(&options.paths);
    let mut config = Config::load_from(&root)?.unwrap_or_default();
    config.ignore_files.extend(options.ignore.iter().cloned());
    config.verbose |= options.verbose;
    Ok(config)
}

fn config_root(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(path) if path.is_dir() => path.clone(),
        Some(path) => path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        None => PathBuf::from("."),
    }
}

fn load_sources(paths: &[PathBuf]) -> Result<Vec<(PathBuf, String)>> {
    let mut sources = Vec::new();
    for target in paths {
        for file in find_source_files(target)? {
            match fs::read_to_string(&file) {
                Ok(source) => sources.push((file, source)),
                Err(err) => log::warn!("skipping {}: {}", file.display(), err),
            }
        }
    }
    Ok(sources)
}
