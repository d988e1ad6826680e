//! The init command: write a starter configuration file.

use crate::config::Config;
use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = ".nplusone.toml";

/// Write a default `.nplusone.toml` in the current directory. Refuses to
/// overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<()> {
    init_config_at(Path::new("."), force)
}

fn init_config_at(dir: &Path, force: bool) -> Result<()> {
    let target = dir.join(CONFIG_FILE);
    if target.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    let rendered = toml::to_string_pretty(&Config::default())?;
    fs::write(&target, rendered)?;
    println!("Created {}", target.display());
    Ok(())
}
