//! Package index: maps package names to install prefixes.
//!
//! A prefix is an install root laid out as `<prefix>/share/<package>` for
//! data (worlds, launch descriptions, config) and `<prefix>/lib/<package>`
//! for executables. Prefixes are searched in order; the first match wins.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable holding simlaunch-specific install prefixes.
pub const PREFIX_PATH_ENV: &str = "SIMLAUNCH_PREFIX_PATH";

/// Environment variable set by sourced ROS workspaces.
pub const AMENT_PREFIX_PATH_ENV: &str = "AMENT_PREFIX_PATH";

/// An ordered list of install prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageIndex {
    prefixes: Vec<PathBuf>,
}

impl PackageIndex {
    /// An index with no prefixes. Every lookup misses.
    pub const EMPTY: PackageIndex = PackageIndex {
        prefixes: Vec::new(),
    };

    /// Build an index from explicit prefixes, searched in the given order.
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Build an index from the environment.
    ///
    /// Priority: `SIMLAUNCH_PREFIX_PATH`, then `AMENT_PREFIX_PATH`. Both use
    /// the platform path-list syntax. Returns `None` if neither is set.
    pub fn from_env() -> Option<Self> {
        [PREFIX_PATH_ENV, AMENT_PREFIX_PATH_ENV]
            .into_iter()
            .find_map(env::var_os)
            .map(|value| Self::new(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty())))
    }

    /// The prefixes in search order.
    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }

    /// Return the first existing `<prefix>/share/<package>` directory.
    pub fn share_dir(&self, package: &str) -> Option<PathBuf> {
        self.prefixes
            .iter()
            .map(|prefix| prefix.join("share").join(package))
            .find(|dir| dir.is_dir())
    }

    /// Return the first existing `<prefix>/lib/<package>/<executable>` file.
    pub fn executable(&self, package: &str, executable: &str) -> Option<PathBuf> {
        self.prefixes
            .iter()
            .map(|prefix| prefix.join("lib").join(package).join(executable))
            .find(|path| path.is_file())
    }

    /// Resolve `relative` inside a package's share directory, returning the
    /// path only if it names an existing file.
    pub fn share_file(&self, package: &str, relative: impl AsRef<Path>) -> Option<PathBuf> {
        self.share_dir(package)
            .map(|dir| dir.join(relative))
            .filter(|path| path.is_file())
    }
}
