//! Substitution evaluation.
//!
//! Resolution is depth-first and left to right. Nothing is cached between
//! calls: resolving the same command node twice runs the command twice.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::Substitution;
use super::runner::{CommandRunner, SystemRunner};
use crate::catalog::ArgumentValues;
use crate::package::PackageIndex;

static SYSTEM_RUNNER: SystemRunner = SystemRunner;
static NO_PACKAGES: PackageIndex = PackageIndex::EMPTY;

/// Errors raised while resolving a substitution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("argument {0:?} has no value")]
    UnboundArgument(String),

    #[error("condition resolved to {0:?}, expected true or false")]
    MalformedPredicate(String),

    #[error("executable {0:?} not found")]
    ExecutableNotFound(String),

    #[error("command {command:?} exited with {}: {}", exit_code.map_or_else(|| "a signal".to_owned(), |c| format!("code {c}")), stderr.trim())]
    ExternalCommand {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to run command {command:?}: {source}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("package {0:?} not found in any install prefix")]
    UnknownPackage(String),

    #[error("environment variable {0:?} is not set")]
    UnsetEnvironmentVariable(String),
}

/// Parse a boolean token as used by conditional predicates.
///
/// Accepts `true`/`false` in any letter case, plus `1`/`0`.
pub fn parse_bool_token(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") || token == "1" {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") || token == "0" {
        Some(false)
    } else {
        None
    }
}

fn bool_token(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Evaluates substitutions against one set of argument values.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    arguments: &'a ArgumentValues,
    runner: &'a dyn CommandRunner,
    packages: &'a PackageIndex,
}

impl<'a> Resolver<'a> {
    /// A resolver that runs commands on the host and knows no packages.
    pub fn new(arguments: &'a ArgumentValues) -> Self {
        Self {
            arguments,
            runner: &SYSTEM_RUNNER,
            packages: &NO_PACKAGES,
        }
    }

    /// Use `runner` for command and executable lookups.
    pub fn with_runner(mut self, runner: &'a dyn CommandRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Use `packages` for package share lookups.
    pub fn with_packages(mut self, packages: &'a PackageIndex) -> Self {
        self.packages = packages;
        self
    }

    pub fn arguments(&self) -> &ArgumentValues {
        self.arguments
    }

    /// Resolve `node` to a string.
    pub fn resolve(&self, node: &Substitution) -> Result<String, ResolveError> {
        match node {
            Substitution::Literal(value) => Ok(value.clone()),
            Substitution::ArgumentRef(name) => self
                .arguments
                .get(name)
                .map(str::to_owned)
                .ok_or_else(|| ResolveError::UnboundArgument(name.clone())),
            Substitution::PathJoin(parts) => {
                let mut path = PathBuf::new();
                for part in parts {
                    path.push(self.resolve(part)?);
                }
                Ok(path.to_string_lossy().into_owned())
            }
            Substitution::Concat(parts) => {
                let mut joined = String::new();
                for part in parts {
                    joined.push_str(&self.resolve(part)?);
                }
                Ok(joined)
            }
            Substitution::Command { executable, args } => self.run_command(executable, args),
            Substitution::FindExecutable(name) => self
                .locate(name)
                .map(|path| path.to_string_lossy().into_owned()),
            Substitution::PackageShare(package) => self
                .packages
                .share_dir(package)
                .map(|dir| dir.to_string_lossy().into_owned())
                .ok_or_else(|| ResolveError::UnknownPackage(package.clone())),
            Substitution::EnvironmentVariable { name, default } => {
                match (std::env::var(name), default) {
                    (Ok(value), _) => Ok(value),
                    (Err(_), Some(default)) => Ok(default.clone()),
                    (Err(_), None) => Err(ResolveError::UnsetEnvironmentVariable(name.clone())),
                }
            }
            Substitution::Equals(lhs, rhs) => {
                let lhs = self.resolve(lhs)?;
                let rhs = self.resolve(rhs)?;
                Ok(bool_token(lhs == rhs).to_owned())
            }
            Substitution::Conditional {
                predicate,
                if_true,
                if_false,
            } => {
                let token = self.resolve(predicate)?;
                match parse_bool_token(&token) {
                    Some(true) => self.resolve(if_true),
                    Some(false) => self.resolve(if_false),
                    None => Err(ResolveError::MalformedPredicate(token)),
                }
            }
        }
    }

    /// Resolve every node in order, stopping at the first failure.
    pub fn resolve_all(&self, nodes: &[Substitution]) -> Result<Vec<String>, ResolveError> {
        nodes.iter().map(|node| self.resolve(node)).collect()
    }

    /// Find an executable. Names containing a path separator are taken as
    /// paths and must exist; bare names are searched for by the runner.
    fn locate(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let located = if name.contains(std::path::is_separator) {
            Some(PathBuf::from(name)).filter(|path| path.is_file())
        } else {
            self.runner.locate(name)
        };
        located.ok_or_else(|| ResolveError::ExecutableNotFound(name.to_owned()))
    }

    fn run_command(&self, executable: &str, args: &[Substitution]) -> Result<String, ResolveError> {
        let args = self.resolve_all(args)?;
        let program = self.locate(executable)?;
        let command_line = display_command(&program, &args);

        debug!(command = %command_line, "running command substitution");
        let output = self
            .runner
            .run(&program, &args)
            .map_err(|source| ResolveError::CommandIo {
                command: command_line.clone(),
                source,
            })?;

        if !output.success() {
            return Err(ResolveError::ExternalCommand {
                command: command_line,
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        if !output.stderr.trim().is_empty() {
            warn!(command = %command_line, stderr = %output.stderr.trim(), "command substitution wrote to stderr");
        }

        Ok(output.stdout)
    }
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("arguments", &self.arguments)
            .field("packages", &self.packages)
            .finish_non_exhaustive()
    }
}

fn display_command(program: &Path, args: &[String]) -> String {
    let mut display = program.display().to_string();
    for arg in args {
        display.push(' ');
        display.push_str(arg);
    }
    display
}
