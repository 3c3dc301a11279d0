//! Engine configuration file.
//!
//! ```toml
//! hash_mb = 64
//! eval_file = "nets/default.nnue"
//! move_overhead_ms = 30
//! log_level = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pvs_engine::{DEFAULT_HASH_MB, MAX_HASH_MB};
use serde::Deserialize;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "UCI_ENGINE_CONFIG";
/// Picked up from the working directory when nothing else names a file.
pub const DEFAULT_CONFIG_FILE: &str = "engine.toml";

const DEFAULT_MOVE_OVERHEAD_MS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub hash_mb: usize,
    pub eval_file: Option<PathBuf>,
    pub move_overhead_ms: u64,
    pub log_level: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: DEFAULT_HASH_MB,
            eval_file: None,
            move_overhead_ms: DEFAULT_MOVE_OVERHEAD_MS,
            log_level: None,
        }
    }
}

/// Where the configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
    /// `engine.toml` existed but could not be used; defaults apply.
    IgnoredDefaultFile(PathBuf, anyhow::Error),
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: EngineConfig = toml::from_str(text).context("invalid configuration")?;
        config.hash_mb = config.hash_mb.clamp(1, MAX_HASH_MB);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Finds the configuration: an explicit `--config` path, then the
    /// environment variable, then `engine.toml` in the working directory.
    ///
    /// A file that was asked for by name must load. The implicit default file
    /// is allowed to be broken; the caller gets the error back to report.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        if let Some(path) = named {
            let config = Self::load(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if !fallback.exists() {
            return Ok((Self::default(), ConfigSource::Defaults));
        }
        match Self::load(&fallback) {
            Ok(config) => Ok((config, ConfigSource::File(fallback))),
            Err(err) => Ok((Self::default(), ConfigSource::IgnoredDefaultFile(fallback, err))),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
