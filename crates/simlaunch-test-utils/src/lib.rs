//! Shared test utilities for simlaunch integration tests.
//!
//! Provides [`PackageTree`], a throwaway install prefix laid out like a real
//! one (`share/<package>/...` and `lib/<package>/...`), plus a scripted
//! [`CommandRunner`] for command substitutions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use simlaunch_core::package::PackageIndex;
use simlaunch_core::substitution::{CommandOutput, CommandRunner};

/// A temporary install prefix. Removed when dropped.
pub struct PackageTree {
    root: TempDir,
}

impl PackageTree {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("failed to create temp prefix"),
        }
    }

    /// The prefix directory.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Create empty `share/<package>` and `lib/<package>` directories.
    pub fn add_package(&self, package: &str) -> &Self {
        for dir in ["share", "lib"] {
            let path = self.root.path().join(dir).join(package);
            std::fs::create_dir_all(&path)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", path.display()));
        }
        self
    }

    /// Write `contents` to `share/<package>/<relative>`, creating parents.
    pub fn write_share_file(&self, package: &str, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.path().join("share").join(package).join(relative);
        write_with_parents(&path, contents);
        path
    }

    /// Install `lib/<package>/<name>` as an executable shell script.
    pub fn add_executable(&self, package: &str, name: &str, script: &str) -> PathBuf {
        let path = self.root.path().join("lib").join(package).join(name);
        write_with_parents(&path, &format!("#!/bin/sh\n{script}\n"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .unwrap_or_else(|e| panic!("failed to chmod {}: {e}", path.display()));
        }

        path
    }

    /// An index searching only this prefix.
    pub fn index(&self) -> PackageIndex {
        PackageIndex::new([self.root.path()])
    }
}

impl Default for PackageTree {
    fn default() -> Self {
        Self::new()
    }
}

fn write_with_parents(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
    }
    std::fs::write(path, contents)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

/// A [`CommandRunner`] that answers from a fixed table instead of running
/// anything.
///
/// Every known program is located at `/fake/bin/<name>`. Invocations are
/// recorded so tests can check what ran and how often.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` locatable and print `stdout` when run.
    pub fn with_output(mut self, program: &str, stdout: &str) -> Self {
        self.outputs.insert(program.to_owned(), stdout.to_owned());
        self
    }

    /// Every `(program name, args)` run so far, in order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.outputs
            .contains_key(name)
            .then(|| PathBuf::from("/fake/bin").join(name))
    }

    fn run(&self, program: &Path, args: &[String]) -> std::io::Result<CommandOutput> {
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((name.clone(), args.to_vec()));

        match self.outputs.get(&name) {
            Some(stdout) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
                exit_code: Some(0),
            }),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no scripted output for {name}"),
            )),
        }
    }
}

/// The repository root, for tests that load the shipped `share/` tree.
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .expect("workspace root should exist")
}
