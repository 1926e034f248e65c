//! Plan assembly: launch descriptions, loading, and well-formedness checks.

pub mod loader;
pub mod toml_format;

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Argument;
use crate::unit::Unit;

pub use loader::{PlanLoadError, load_plan, load_plan_in_scope, parse_plan_toml};
pub use toml_format::{ArgumentToml, ChoicesToml, DiscoverToml, LaunchToml, SubstitutionToml, UnitToml};

/// Errors raised by [`assemble`].
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("unit {unit:?} references undeclared argument {name:?}")]
    UndeclaredArgument { unit: String, name: String },

    #[error("argument {0:?} is declared more than once")]
    DuplicateArgument(String),
}

/// A validated launch plan: arguments followed by the units to start.
///
/// Only [`assemble`] and [`assemble_in_scope`] build a plan, so every
/// argument reference in its units names one of its arguments or, for an
/// included plan, an argument of an enclosing scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    arguments: Vec<Argument>,
    units: Vec<Unit>,
}

impl Plan {
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|arg| arg.name() == name)
    }
}

/// Validate that every argument referenced by `units` is declared in
/// `arguments` and return the plan.
///
/// Both sequences keep their input order. Nothing is resolved.
pub fn assemble(arguments: Vec<Argument>, units: Vec<Unit>) -> Result<Plan, AssembleError> {
    assemble_in_scope(arguments, units, &[])
}

/// Like [`assemble`], for a plan included from another one: references may
/// also name the arguments visible in the including scope (`enclosing`).
///
/// Arguments declared by a sibling include are never visible.
pub fn assemble_in_scope(
    arguments: Vec<Argument>,
    units: Vec<Unit>,
    enclosing: &[&str],
) -> Result<Plan, AssembleError> {
    let mut declared = HashSet::new();
    for argument in &arguments {
        if !declared.insert(argument.name()) {
            return Err(AssembleError::DuplicateArgument(argument.name().to_owned()));
        }
    }

    for unit in &units {
        if let Some(name) = unit
            .argument_refs()
            .into_iter()
            .find(|name| !declared.contains(name) && !enclosing.contains(name))
        {
            return Err(AssembleError::UndeclaredArgument {
                unit: unit.label(),
                name: name.to_owned(),
            });
        }
    }

    tracing::debug!(
        arguments = arguments.len(),
        units = units.len(),
        "assembled plan"
    );
    Ok(Plan { arguments, units })
}
