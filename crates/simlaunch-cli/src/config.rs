//! Configuration file management for simlaunch.
//!
//! Provides a TOML-based config file at `~/.config/simlaunch/config.toml`
//! and a resolution chain for install prefixes:
//! `--prefix` flags > `SIMLAUNCH_PREFIX_PATH` > `AMENT_PREFIX_PATH` >
//! config file > none.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use simlaunch_core::package::PackageIndex;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub packages: PackagesSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PackagesSection {
    /// Install prefixes, searched in order.
    #[serde(default)]
    pub prefixes: Vec<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the simlaunch config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/simlaunch` or
/// `~/.config/simlaunch`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("simlaunch");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("simlaunch")
}

/// Return the path to the simlaunch config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Load the config file if it exists.
///
/// A missing file is `Ok(None)`; an unreadable or malformed one is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Where the install prefixes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixSource {
    Cli,
    Environment,
    ConfigFile,
    None,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct SimlaunchConfig {
    pub packages: PackageIndex,
    pub source: PrefixSource,
}

impl SimlaunchConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > none.
    ///
    /// With no prefixes from anywhere, package lookups all miss; launch
    /// descriptions given by path that only use `PATH` executables still work.
    pub fn resolve(cli_prefixes: &[PathBuf]) -> Result<Self> {
        let (packages, source) = if !cli_prefixes.is_empty() {
            (PackageIndex::new(cli_prefixes.iter().cloned()), PrefixSource::Cli)
        } else if let Some(packages) = PackageIndex::from_env() {
            (packages, PrefixSource::Environment)
        } else if let Some(file) = load_config()? {
            (
                PackageIndex::new(file.packages.prefixes),
                PrefixSource::ConfigFile,
            )
        } else {
            warn!("no install prefixes configured; run `simlaunch init` or set SIMLAUNCH_PREFIX_PATH");
            (PackageIndex::default(), PrefixSource::None)
        };

        let config = Self { packages, source };
        debug!(source = ?config.source, prefixes = ?config.packages.prefixes(), "resolved install prefixes");
        Ok(config)
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
