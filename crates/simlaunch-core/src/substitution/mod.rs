//! Substitution graph: lazily evaluated string values.
//!
//! A [`Substitution`] is a tree describing how to compute a string once
//! argument values are known. Building one never touches the filesystem or
//! runs anything; see [`Resolver`] for evaluation.

pub mod resolve;
pub mod runner;

use serde::Serialize;

pub use resolve::{ResolveError, Resolver, parse_bool_token};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

/// A node in the substitution graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Substitution {
    /// A fixed string.
    Literal(String),
    /// The value bound to a launch argument.
    ArgumentRef(String),
    /// Parts joined with the platform path separator.
    PathJoin(Vec<Substitution>),
    /// Parts concatenated with no separator.
    Concat(Vec<Substitution>),
    /// Standard output of an external program.
    Command {
        executable: String,
        args: Vec<Substitution>,
    },
    /// Absolute path of an executable found on the search path.
    FindExecutable(String),
    /// Share directory of an installed package.
    PackageShare(String),
    /// Value of an environment variable, with an optional fallback.
    EnvironmentVariable {
        name: String,
        default: Option<String>,
    },
    /// `true` if both sides resolve to the same string, `false` otherwise.
    Equals(Box<Substitution>, Box<Substitution>),
    /// Resolves `predicate` and then exactly one of the two branches.
    Conditional {
        predicate: Box<Substitution>,
        if_true: Box<Substitution>,
        if_false: Box<Substitution>,
    },
}

impl Substitution {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn arg(name: impl Into<String>) -> Self {
        Self::ArgumentRef(name.into())
    }

    pub fn path_join(parts: impl IntoIterator<Item = Substitution>) -> Self {
        Self::PathJoin(parts.into_iter().collect())
    }

    pub fn concat(parts: impl IntoIterator<Item = Substitution>) -> Self {
        Self::Concat(parts.into_iter().collect())
    }

    pub fn command(
        executable: impl Into<String>,
        args: impl IntoIterator<Item = Substitution>,
    ) -> Self {
        Self::Command {
            executable: executable.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn find_executable(name: impl Into<String>) -> Self {
        Self::FindExecutable(name.into())
    }

    pub fn package_share(package: impl Into<String>) -> Self {
        Self::PackageShare(package.into())
    }

    pub fn env(name: impl Into<String>, default: Option<String>) -> Self {
        Self::EnvironmentVariable {
            name: name.into(),
            default,
        }
    }

    pub fn equals(lhs: Substitution, rhs: Substitution) -> Self {
        Self::Equals(Box::new(lhs), Box::new(rhs))
    }

    pub fn conditional(predicate: Substitution, if_true: Substitution, if_false: Substitution) -> Self {
        Self::Conditional {
            predicate: Box::new(predicate),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// Collect the names of every argument referenced in this tree,
    /// depth-first and left to right, both conditional branches included.
    pub fn argument_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::ArgumentRef(name) => out.push(name),
            Self::PathJoin(parts) | Self::Concat(parts) => {
                parts.iter().for_each(|p| p.argument_refs(out));
            }
            Self::Command { args, .. } => args.iter().for_each(|a| a.argument_refs(out)),
            Self::Equals(lhs, rhs) => {
                lhs.argument_refs(out);
                rhs.argument_refs(out);
            }
            Self::Conditional {
                predicate,
                if_true,
                if_false,
            } => {
                predicate.argument_refs(out);
                if_true.argument_refs(out);
                if_false.argument_refs(out);
            }
            Self::Literal(_)
            | Self::FindExecutable(_)
            | Self::PackageShare(_)
            | Self::EnvironmentVariable { .. } => {}
        }
    }
}

impl From<&str> for Substitution {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl From<String> for Substitution {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}
