//! Launcher: resolves a plan unit by unit and starts its processes.
//!
//! Units are handled strictly in plan order. Each node is resolved right
//! before it is handed to the [`Spawner`]; each include is loaded and
//! launched recursively in place, seeing the arguments of every enclosing
//! scope unless it declares the same name itself. The first failure stops
//! the launch.
//! Processes started before the failure are left with the spawner, and the
//! caller decides how to stop them.

pub mod spawner;

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::catalog::{ArgumentError, ArgumentValues, resolve_values};
use crate::package::PackageIndex;
use crate::plan::{Plan, PlanLoadError, load_plan_in_scope};
use crate::substitution::{CommandRunner, ResolveError, Resolver, Substitution, SystemRunner};
use crate::unit::{IncludeUnit, NodeUnit, Unit};

pub use spawner::{ExitedProcess, TokioSpawner};

/// Nested includes deeper than this are treated as a cycle.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Errors that stop a launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid arguments for {scope}: {source}")]
    Argument {
        scope: String,
        #[source]
        source: ArgumentError,
    },

    #[error("failed to resolve {unit}: {source}")]
    Resolve {
        unit: String,
        #[source]
        source: ResolveError,
    },

    #[error("failed to load included launch description {locator}: {source}")]
    Load {
        locator: String,
        #[source]
        source: Box<PlanLoadError>,
    },

    #[error("failed to start {unit}: {source}")]
    Spawn {
        unit: String,
        #[source]
        source: std::io::Error,
    },

    #[error("include depth limit exceeded at {locator} (include cycle?)")]
    IncludeDepthExceeded { locator: String },
}

/// A fully resolved process, ready to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub label: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ProcessSpec {
    /// The program and its arguments joined with spaces, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Starts resolved processes.
pub trait Spawner {
    fn spawn(&mut self, spec: ProcessSpec) -> std::io::Result<()>;
}

/// Records process specs without starting anything.
#[derive(Debug, Default)]
pub struct DryRunSpawner {
    specs: Vec<ProcessSpec>,
}

impl DryRunSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn specs(&self) -> &[ProcessSpec] {
        &self.specs
    }

    pub fn into_specs(self) -> Vec<ProcessSpec> {
        self.specs
    }
}

impl Spawner for DryRunSpawner {
    fn spawn(&mut self, spec: ProcessSpec) -> std::io::Result<()> {
        self.specs.push(spec);
        Ok(())
    }
}

static SYSTEM_RUNNER: SystemRunner = SystemRunner;

/// Collaborators shared by every scope of a launch.
#[derive(Clone, Copy)]
pub struct LaunchContext<'a> {
    packages: &'a PackageIndex,
    runner: &'a dyn CommandRunner,
}

impl<'a> LaunchContext<'a> {
    /// A context that runs command substitutions on the host.
    pub fn new(packages: &'a PackageIndex) -> Self {
        Self {
            packages,
            runner: &SYSTEM_RUNNER,
        }
    }

    /// Use `runner` for command substitutions and `PATH` lookups.
    pub fn with_runner(mut self, runner: &'a dyn CommandRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn packages(&self) -> &PackageIndex {
        self.packages
    }
}

impl std::fmt::Debug for LaunchContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchContext")
            .field("packages", &self.packages)
            .finish_non_exhaustive()
    }
}

/// Launch `plan` with the given argument overrides.
///
/// Returns the number of processes handed to `spawner`.
pub fn launch(
    plan: &Plan,
    overrides: &[(String, String)],
    context: LaunchContext<'_>,
    spawner: &mut dyn Spawner,
) -> Result<usize, LaunchError> {
    let outer = ArgumentValues::new();
    let scope = Scope {
        name: "launch description",
        depth: 0,
        outer: &outer,
    };
    launch_scope(plan, overrides, scope, context, spawner)
}

/// Where a plan is launched from.
struct Scope<'s> {
    name: &'s str,
    depth: usize,
    /// Values visible from the including scopes.
    outer: &'s ArgumentValues,
}

fn launch_scope(
    plan: &Plan,
    overrides: &[(String, String)],
    scope: Scope<'_>,
    context: LaunchContext<'_>,
    spawner: &mut dyn Spawner,
) -> Result<usize, LaunchError> {
    let values = resolve_values(plan.arguments(), overrides)
        .map_err(|source| LaunchError::Argument {
            scope: scope.name.to_owned(),
            source,
        })?
        .layered_over(scope.outer);
    let resolver = Resolver::new(&values)
        .with_runner(context.runner)
        .with_packages(context.packages);

    let mut started = 0;
    for unit in plan.units() {
        match unit {
            Unit::Node(node) => {
                let spec = resolve_node(node, &resolver, context.packages)?;
                info!(unit = %spec.label, command = %spec.command_line(), "starting process");
                spawner.spawn(spec).map_err(|source| LaunchError::Spawn {
                    unit: node.label(),
                    source,
                })?;
                started += 1;
            }
            Unit::Include(include) => {
                started += launch_include(include, &resolver, scope.depth, context, spawner)?;
            }
        }
    }

    Ok(started)
}

fn launch_include(
    include: &IncludeUnit,
    resolver: &Resolver<'_>,
    depth: usize,
    context: LaunchContext<'_>,
    spawner: &mut dyn Spawner,
) -> Result<usize, LaunchError> {
    let locator = include.locator.to_string();
    if depth >= MAX_INCLUDE_DEPTH {
        return Err(LaunchError::IncludeDepthExceeded { locator });
    }

    let overrides = include
        .arguments
        .iter()
        .map(|(name, value)| resolver.resolve(value).map(|value| (name.clone(), value)))
        .collect::<Result<Vec<_>, ResolveError>>()
        .map_err(|source| LaunchError::Resolve {
            unit: locator.clone(),
            source,
        })?;

    let visible: Vec<&str> = resolver.arguments().names().collect();
    let plan = load_plan_in_scope(&include.file, context.packages, &visible).map_err(|source| {
        LaunchError::Load {
            locator: locator.clone(),
            source: Box::new(source),
        }
    })?;

    info!(include = %locator, depth = depth + 1, "including launch description");
    let scope = Scope {
        name: &locator,
        depth: depth + 1,
        outer: resolver.arguments(),
    };
    launch_scope(&plan, &overrides, scope, context, spawner)
}

/// Resolve a node into the process to start.
///
/// The command line is the node's own arguments followed by `--ros-args`
/// with the node name remapping and one `-p key:=value` per parameter.
pub fn resolve_node(
    node: &NodeUnit,
    resolver: &Resolver<'_>,
    packages: &PackageIndex,
) -> Result<ProcessSpec, LaunchError> {
    let label = node.label();
    let resolve_error = |source| LaunchError::Resolve {
        unit: label.clone(),
        source,
    };

    let program = match &node.package {
        Some(package) => packages
            .executable(package, &node.executable)
            .ok_or_else(|| {
                ResolveError::ExecutableNotFound(format!("{package}/{}", node.executable))
            })
            .map_err(resolve_error)?,
        None => resolver
            .resolve(&Substitution::find_executable(node.executable.as_str()))
            .map(PathBuf::from)
            .map_err(resolve_error)?,
    };

    let mut args = resolver.resolve_all(&node.arguments).map_err(resolve_error)?;

    if node.name.is_some() || !node.parameters.is_empty() {
        args.push("--ros-args".to_owned());
    }
    if let Some(name) = &node.name {
        args.push("-r".to_owned());
        args.push(format!("__node:={name}"));
    }
    for (key, value) in &node.parameters {
        let value = resolver.resolve(value).map_err(resolve_error)?;
        args.push("-p".to_owned());
        args.push(format!("{key}:={value}"));
    }

    Ok(ProcessSpec {
        label: label.clone(),
        program,
        args,
    })
}
