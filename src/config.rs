use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// File names probed for configuration, in order.
const CONFIG_FILE_NAMES: &[&str] = &[".nplusone.toml", "nplusone.toml"];

/// The set of method names recognized as query-issuing methods of the
/// target ORM library. Matching is by simple name only; the roster is
/// overridable through configuration to target other libraries or a
/// broader method list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryMethodSet(BTreeSet<String>);

impl QueryMethodSet {
    pub fn contains(&self, method: &str) -> bool {
        self.0.contains(method)
    }

    pub fn insert(&mut self, method: impl Into<String>) {
        self.0.insert(method.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for QueryMethodSet {
    fn default() -> Self {
        [
            "Find",
            "First",
            "Last",
            "Take",
            "Where",
            "Model",
            "Select",
            "Updates",
            "Update",
            "Association",
        ]
        .into_iter()
        .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for QueryMethodSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Analyzer configuration. Seeded once by the command layer before the
/// core runs; read-only during analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Method names treated as database query calls.
    #[serde(default)]
    pub query_methods: QueryMethodSet,

    /// Glob patterns of files skipped by the loop collector.
    #[serde(default)]
    pub ignore_files: Vec<String>,

    /// Emit trace output while analyzing.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Load configuration from `.nplusone.toml` (or `nplusone.toml`) in
    /// the given directory. Returns `None` when no config file exists;
    /// a file that exists but fails to parse is an error.
    pub fn load_from(dir: &Path) -> anyhow::Result<Option<Self>> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                let raw = fs::read_to_string(&candidate)?;
                let config = toml::from_str(&raw).map_err(|e| {
                    anyhow::anyhow!("failed to parse {}: {}", candidate.display(), e)
                })?;
                return Ok(Some(config));
            }
        }
        Ok(None)
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Seed the process-wide configuration. Returns `false` if configuration
/// was already initialized; the first value wins.
pub fn set_config(config: Config) -> bool {
    CONFIG.set(config).is_ok()
}

/// Process-wide configuration; default-constructed when never seeded.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
