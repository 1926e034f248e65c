//! Per-invocation argument values.

use std::collections::HashMap;

use thiserror::Error;

use super::Argument;

/// Errors raised while turning overrides into argument values.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("unknown launch argument {0:?}")]
    UnknownArgument(String),

    #[error("value {value:?} is not allowed for argument {name:?} (expected one of: {})", allowed.join(", "))]
    ValueNotAllowed {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("malformed argument override {0:?} (expected name:=value)")]
    MalformedOverride(String),
}

/// Concrete values of every declared argument for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentValues {
    values: HashMap<String, String>,
}

impl ArgumentValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names that have a binding, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Add the bindings of an enclosing scope. Names bound here shadow
    /// the outer ones.
    pub fn layered_over(mut self, outer: &ArgumentValues) -> Self {
        for (name, value) in &outer.values {
            self.values
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }
}

impl<K, V> FromIterator<(K, V)> for ArgumentValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Resolve the value of every argument: the override when one is given,
/// the declared default otherwise.
///
/// Later overrides of the same name replace earlier ones, and only the
/// surviving value is checked against the argument's allowed set. An
/// override that names no declared argument is rejected.
pub fn resolve_values(
    arguments: &[Argument],
    overrides: &[(String, String)],
) -> Result<ArgumentValues, ArgumentError> {
    let mut chosen: HashMap<&str, &str> = HashMap::new();
    for (name, value) in overrides {
        if !arguments.iter().any(|arg| arg.name() == name) {
            return Err(ArgumentError::UnknownArgument(name.clone()));
        }
        chosen.insert(name.as_str(), value.as_str());
    }

    arguments
        .iter()
        .map(|argument| {
            let Some(value) = chosen.get(argument.name()).copied() else {
                return Ok((argument.name(), argument.default_value()));
            };
            if !argument.accepts(value) {
                return Err(ArgumentError::ValueNotAllowed {
                    name: argument.name().to_owned(),
                    value: value.to_owned(),
                    allowed: argument.allowed().to_vec(),
                });
            }
            Ok((argument.name(), value))
        })
        .collect()
}

/// Parse a command-line override of the form `name:=value` or `name=value`.
///
/// The first `=` ends the name; a `:` right before it belongs to the
/// separator.
pub fn parse_override(input: &str) -> Result<(String, String), ArgumentError> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| ArgumentError::MalformedOverride(input.to_owned()))?;

    let name = name.strip_suffix(':').unwrap_or(name).trim();
    if name.is_empty() {
        return Err(ArgumentError::MalformedOverride(input.to_owned()));
    }

    Ok((name.to_owned(), value.to_owned()))
}
