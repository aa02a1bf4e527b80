use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::fst::{FstIndex, Toolchain};

pub const DEFAULT_PORT: u16 = 5000;

/// Settings read from `~/.cognate/rc`
///
/// The rc file holds `key=value` lines; `#` starts a comment line.
/// Relative paths are resolved against the directory holding the rc file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding lexicons (`data.location`)
    pub data_dir: PathBuf,
    /// Directory of transducer scripts and compiled stacks (`fst.location`)
    pub fst_dir: PathBuf,
    /// Refishing script used when a request brings none (`fst.default`)
    pub default_script: PathBuf,
    pub toolchain: Toolchain,
    pub port: u16,
    pub fst_index: FstIndex,
}

impl Config {
    /// Get the configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cognate")
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("rc")
    }

    /// Defaults rooted at `base`
    pub fn with_base(base: &Path) -> Self {
        let fst_dir = base.join("fsts");
        Self {
            data_dir: base.join("data"),
            default_script: fst_dir.join("refishing-fst.txt"),
            fst_dir,
            toolchain: Toolchain::default(),
            port: DEFAULT_PORT,
            fst_index: FstIndex::burmish(),
        }
    }

    /// Load the rc file, or defaults when there is none
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::with_base(&Self::config_dir()));
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let base = path.parent().unwrap_or(Path::new("."));
        Self::parse(&text, base).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str, base: &Path) -> Result<Self> {
        let mut config = Self::with_base(base);
        let mut default_script = None;
        let resolve = |value: &str| {
            let path = PathBuf::from(value);
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                anyhow::bail!("Expected key=value, got '{}'", line);
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "data.location" => config.data_dir = resolve(value),
                "fst.location" => config.fst_dir = resolve(value),
                "fst.default" => default_script = Some(resolve(value)),
                "foma.command" => config.toolchain.foma = value.to_string(),
                "flookup.command" => config.toolchain.flookup = value.to_string(),
                "server.port" => {
                    config.port = value
                        .parse()
                        .with_context(|| format!("Invalid server.port '{}'", value))?;
                }
                _ => match key.strip_prefix("fst.index.") {
                    Some(doculect) if !doculect.is_empty() => config.fst_index.insert(doculect, value),
                    _ => log::warn!("Unknown config key '{}'", key),
                },
            }
        }

        config.default_script = default_script.unwrap_or_else(|| config.fst_dir.join("refishing-fst.txt"));
        Ok(config)
    }

    /// The lexicon used when none is named
    pub fn default_lexicon(&self) -> PathBuf {
        self.data_dir.join("lexicon.tsv")
    }
}
