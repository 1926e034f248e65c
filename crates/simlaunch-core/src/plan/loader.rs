//! Launch description loader.
//!
//! Turns a `*.launch.toml` file into a validated [`Plan`]:
//! - Arguments are declared through the catalog, discovering choices from
//!   package share directories where requested.
//! - Units are built with the unit constructors; includes must exist.
//! - The result goes through [`assemble`](super::assemble), or [`assemble_in_scope`] for a
//!   description included from another one.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::toml_format::{ArgumentToml, ChoicesToml, LaunchToml, SubstitutionToml, UnitToml};
use super::{AssembleError, Plan, assemble_in_scope};
use crate::catalog::{Argument, CatalogError, declare_argument, discover_choices};
use crate::package::PackageIndex;
use crate::substitution::Substitution;
use crate::unit::{NodeUnit, PlanLocator, Unit, UnitError, make_included, make_node};

/// Errors that can occur while loading a launch description.
#[derive(Debug, Error)]
pub enum PlanLoadError {
    #[error("failed to read launch description {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("argument {argument:?} discovers choices in unknown package {package:?}")]
    UnknownPackage { argument: String, package: String },

    #[error("argument {0:?} has no default and no choices to take one from")]
    MissingDefault(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Read and build the launch description at `path`.
pub fn load_plan(path: &Path, packages: &PackageIndex) -> Result<Plan, PlanLoadError> {
    load_plan_in_scope(path, packages, &[])
}

/// Read and build a launch description included from another one. Its
/// units may reference the `enclosing` argument names.
pub fn load_plan_in_scope(
    path: &Path,
    packages: &PackageIndex,
    enclosing: &[&str],
) -> Result<Plan, PlanLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| PlanLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loading launch description");
    let launch: LaunchToml = toml::from_str(&content)?;
    build_plan(launch, packages, enclosing)
}

/// Parse a launch description string and build its plan.
pub fn parse_plan_toml(content: &str, packages: &PackageIndex) -> Result<Plan, PlanLoadError> {
    let launch: LaunchToml = toml::from_str(content)?;
    build_plan(launch, packages, &[])
}

/// Build a plan from an already parsed launch description.
pub fn build_plan(
    launch: LaunchToml,
    packages: &PackageIndex,
    enclosing: &[&str],
) -> Result<Plan, PlanLoadError> {
    let arguments = launch
        .arguments
        .into_iter()
        .map(|arg| build_argument(arg, packages))
        .collect::<Result<Vec<_>, _>>()?;

    let units = launch
        .units
        .into_iter()
        .map(|unit| build_unit(unit, packages))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(assemble_in_scope(arguments, units, enclosing)?)
}

fn build_argument(arg: ArgumentToml, packages: &PackageIndex) -> Result<Argument, PlanLoadError> {
    let allowed = match arg.choices {
        None => Vec::new(),
        Some(ChoicesToml::List(values)) => values,
        Some(ChoicesToml::Discover { discover }) => {
            let share = packages.share_dir(&discover.package).ok_or_else(|| {
                PlanLoadError::UnknownPackage {
                    argument: arg.name.clone(),
                    package: discover.package.clone(),
                }
            })?;
            let directory = share.join(&discover.directory);
            let choices = discover_choices(&directory, &discover.suffix)?;
            if choices.is_empty() {
                return Err(CatalogError::NoChoices {
                    name: arg.name,
                    path: directory,
                    suffix: discover.suffix,
                }
                .into());
            }
            choices
        }
    };

    let default = match (arg.default, allowed.first()) {
        (Some(default), _) => default,
        (None, Some(first)) => first.clone(),
        (None, None) => return Err(PlanLoadError::MissingDefault(arg.name)),
    };

    Ok(declare_argument(arg.name, arg.description, default, allowed)?)
}

fn build_unit(unit: UnitToml, packages: &PackageIndex) -> Result<Unit, PlanLoadError> {
    match unit {
        UnitToml::Node {
            package,
            executable,
            name,
            arguments,
            parameters,
        } => {
            let mut target = NodeUnit::new(package, executable)
                .arguments(arguments.into_iter().map(SubstitutionToml::into_substitution).collect());
            if let Some(name) = name {
                target = target.name(name);
            }
            Ok(make_node(target, convert_map(parameters)))
        }
        UnitToml::Include {
            package,
            path,
            arguments,
        } => {
            let locator = PlanLocator {
                package,
                path: PathBuf::from(path),
            };
            Ok(make_included(locator, convert_map(arguments), packages)?)
        }
    }
}

fn convert_map(
    entries: impl IntoIterator<Item = (String, SubstitutionToml)>,
) -> Vec<(String, Substitution)> {
    entries
        .into_iter()
        .map(|(key, value)| (key, value.into_substitution()))
        .collect()
}
