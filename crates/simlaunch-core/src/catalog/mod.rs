//! Argument catalog: launch argument declarations and choice discovery.
//!
//! Arguments are declared once per launch description and never change.
//! Their concrete values for a single invocation live in
//! [`ArgumentValues`](values::ArgumentValues).

pub mod values;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use values::{ArgumentError, ArgumentValues, parse_override, resolve_values};

/// Errors raised while building the argument catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to list choices in {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("default {default:?} of argument {name:?} is not one of the allowed values: {}", allowed.join(", "))]
    InvalidDefault {
        name: String,
        default: String,
        allowed: Vec<String>,
    },

    #[error("no entries ending in {suffix:?} found in {} for argument {name:?}", path.display())]
    NoChoices {
        name: String,
        path: PathBuf,
        suffix: String,
    },
}

/// A declared launch argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    name: String,
    description: String,
    default: String,
    /// Allowed values in declaration order. Empty means unconstrained.
    allowed: Vec<String>,
}

impl Argument {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Return `true` if `value` is acceptable for this argument.
    pub fn accepts(&self, value: &str) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|a| a == value)
    }
}

/// Declare an argument, checking that the default is one of the allowed
/// values when the argument is constrained.
pub fn declare_argument(
    name: impl Into<String>,
    description: impl Into<String>,
    default: impl Into<String>,
    allowed: Vec<String>,
) -> Result<Argument, CatalogError> {
    let argument = Argument {
        name: name.into(),
        description: description.into(),
        default: default.into(),
        allowed,
    };

    if !argument.accepts(&argument.default) {
        return Err(CatalogError::InvalidDefault {
            name: argument.name,
            default: argument.default,
            allowed: argument.allowed,
        });
    }

    Ok(argument)
}

/// List the entries of `directory` whose file name ends with `suffix`,
/// returning each name with the suffix stripped.
///
/// Entries keep the order the filesystem enumerates them in. An empty
/// result is not an error here; callers that need at least one choice
/// must check for it.
pub fn discover_choices(directory: &Path, suffix: &str) -> Result<Vec<String>, CatalogError> {
    let discovery_error = |source| CatalogError::Discovery {
        path: directory.to_path_buf(),
        source,
    };

    let mut choices = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;
        let file_name = entry.file_name();
        // Non UTF-8 names cannot be passed as argument values.
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(stem) = file_name.strip_suffix(suffix) {
            choices.push(stem.to_owned());
        }
    }

    tracing::debug!(
        directory = %directory.display(),
        suffix,
        count = choices.len(),
        "discovered argument choices"
    );
    Ok(choices)
}
