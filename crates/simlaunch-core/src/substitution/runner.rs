//! Executable lookup and synchronous invocation for command substitutions.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of running an external program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Locates and runs external programs on behalf of the resolver.
///
/// Implementations must run the program to completion before returning.
pub trait CommandRunner: Send + Sync {
    /// Find `name` on the search path.
    fn locate(&self, name: &str) -> Option<PathBuf>;

    /// Run `program` with `args`, capturing its output.
    fn run(&self, program: &Path, args: &[String]) -> std::io::Result<CommandOutput>;
}

/// Runs programs as real child processes, searching `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        find_executable_in_path(name)
    }

    fn run(&self, program: &Path, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Search each `PATH` entry for an executable file named `name`.
pub fn find_executable_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|base| base.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
