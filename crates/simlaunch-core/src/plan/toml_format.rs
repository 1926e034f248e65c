//! TOML format types for launch description files.
//!
//! These types map directly to the `*.launch.toml` on-disk format and are
//! deserialized via `serde` + the `toml` crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::substitution::Substitution;

/// Top-level structure of a launch description file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LaunchToml {
    /// Declared arguments, in order.
    #[serde(default)]
    pub arguments: Vec<ArgumentToml>,
    /// Units to start, in order.
    #[serde(default)]
    pub units: Vec<UnitToml>,
}

/// A single `[[arguments]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArgumentToml {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Default value. When absent, the first choice is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<ChoicesToml>,
}

/// Allowed values of an argument: a fixed list or a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChoicesToml {
    List(Vec<String>),
    Discover { discover: DiscoverToml },
}

/// `choices = { discover = { ... } }`: one choice per matching file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DiscoverToml {
    /// Package whose share directory holds `directory`.
    pub package: String,
    /// Directory relative to the package share directory.
    pub directory: String,
    /// File name suffix to match and strip (e.g. `.sdf`).
    pub suffix: String,
}

/// A single `[[units]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitToml {
    Node {
        /// Package providing the executable; omit to search `PATH`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        package: Option<String>,
        executable: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        arguments: Vec<SubstitutionToml>,
        /// Passed as `-p key:=value`, in the order written.
        #[serde(default)]
        parameters: IndexMap<String, SubstitutionToml>,
    },
    Include {
        package: String,
        /// Path of the launch description relative to the package share directory.
        path: String,
        #[serde(default)]
        arguments: IndexMap<String, SubstitutionToml>,
    },
}

/// A substitution as written in TOML.
///
/// Scalars are literals and arrays are concatenations; a single-key table
/// selects one of the [`ExprToml`] forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SubstitutionToml {
    Text(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    List(Vec<SubstitutionToml>),
    Expr(ExprToml),
}

/// Table forms of a substitution, e.g. `{ arg = "world_name" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ExprToml {
    Arg(String),
    Path(Vec<SubstitutionToml>),
    Command(CommandToml),
    FindExecutable(String),
    PackageShare(String),
    Env(EnvToml),
    Equals(Box<SubstitutionToml>, Box<SubstitutionToml>),
    If(Box<IfToml>),
}

/// `{ command = { executable = "xacro", args = [...] } }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommandToml {
    pub executable: String,
    #[serde(default)]
    pub args: Vec<SubstitutionToml>,
}

/// `{ env = { name = "HOME", default = "/tmp" } }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnvToml {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// `{ if = { condition = ..., then = ..., else = ... } }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IfToml {
    pub condition: SubstitutionToml,
    pub then: SubstitutionToml,
    #[serde(rename = "else")]
    pub otherwise: SubstitutionToml,
}

impl SubstitutionToml {
    /// Convert into a substitution node. Floats keep their decimal point.
    pub fn into_substitution(self) -> Substitution {
        match self {
            Self::Text(text) => Substitution::Literal(text),
            Self::Bool(value) => Substitution::Literal(value.to_string()),
            Self::Integer(value) => Substitution::Literal(value.to_string()),
            Self::Float(value) => Substitution::Literal(format!("{value:?}")),
            Self::List(parts) => Substitution::concat(parts.into_iter().map(Self::into_substitution)),
            Self::Expr(expr) => expr.into_substitution(),
        }
    }
}

impl ExprToml {
    fn into_substitution(self) -> Substitution {
        match self {
            Self::Arg(name) => Substitution::ArgumentRef(name),
            Self::Path(parts) => {
                Substitution::path_join(parts.into_iter().map(SubstitutionToml::into_substitution))
            }
            Self::Command(command) => Substitution::command(
                command.executable,
                command.args.into_iter().map(SubstitutionToml::into_substitution),
            ),
            Self::FindExecutable(name) => Substitution::FindExecutable(name),
            Self::PackageShare(package) => Substitution::PackageShare(package),
            Self::Env(env) => Substitution::env(env.name, env.default),
            Self::Equals(lhs, rhs) => {
                Substitution::equals(lhs.into_substitution(), rhs.into_substitution())
            }
            Self::If(branches) => {
                let IfToml {
                    condition,
                    then,
                    otherwise,
                } = *branches;
                Substitution::conditional(
                    condition.into_substitution(),
                    then.into_substitution(),
                    otherwise.into_substitution(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        value: SubstitutionToml,
    }

    fn parse(value: &str) -> Substitution {
        let wrapper: Wrapper = toml::from_str(&format!("value = {value}"))
            .unwrap_or_else(|e| panic!("failed to parse {value}: {e}"));
        wrapper.value.into_substitution()
    }

    #[test]
    fn scalars_are_literals() {
        assert_eq!(parse(r#""plain""#), Substitution::literal("plain"));
        assert_eq!(parse("true"), Substitution::literal("true"));
        assert_eq!(parse("42"), Substitution::literal("42"));
        assert_eq!(parse("100.0"), Substitution::literal("100.0"));
        assert_eq!(parse("0.5"), Substitution::literal("0.5"));
    }

    #[test]
    fn arrays_are_concatenations() {
        assert_eq!(
            parse(r#"[{ arg = "world_name" }, ".sdf"]"#),
            Substitution::concat([Substitution::arg("world_name"), ".sdf".into()])
        );
    }

    #[test]
    fn table_forms() {
        assert_eq!(
            parse(r#"{ path = [{ package_share = "sim" }, "worlds"] }"#),
            Substitution::path_join([Substitution::package_share("sim"), "worlds".into()])
        );
        assert_eq!(
            parse(r#"{ command = { executable = "xacro", args = ["model.xacro", "name:=robot"] } }"#),
            Substitution::command("xacro", ["model.xacro".into(), "name:=robot".into()])
        );
        assert_eq!(
            parse(r#"{ command = { executable = "date" } }"#),
            Substitution::command("date", Vec::new())
        );
        assert_eq!(
            parse(r#"{ find_executable = "xacro" }"#),
            Substitution::find_executable("xacro")
        );
        assert_eq!(
            parse(r#"{ env = { name = "HOME", default = "/tmp" } }"#),
            Substitution::env("HOME", Some("/tmp".to_owned()))
        );
        assert_eq!(
            parse(r#"{ equals = [{ arg = "gui" }, "True"] }"#),
            Substitution::equals(Substitution::arg("gui"), "True".into())
        );
    }

    #[test]
    fn conditional_form() {
        assert_eq!(
            parse(r#"{ if = { condition = { arg = "start_gui" }, then = "", else = " -s" } }"#),
            Substitution::conditional(Substitution::arg("start_gui"), "".into(), " -s".into())
        );
    }

    #[test]
    fn rejects_unknown_table_form() {
        let result: Result<Wrapper, _> = toml::from_str(r#"value = { python = "1 + 1" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_units() {
        let toml_str = r#"
[[arguments]]
name = "world_name"
choices = { discover = { package = "sim", directory = "worlds", suffix = ".sdf" } }

[[arguments]]
name = "start_gui"
description = "Start the GUI"
default = "True"
choices = ["True", "False"]

[[units]]
type = "node"
package = "ros_gz_bridge"
executable = "parameter_bridge"
[units.parameters]
use_sim_time = true

[[units]]
type = "include"
package = "sim"
path = "launch/gz_sim.launch.toml"
[units.arguments]
gz_args = "-r empty.sdf"
"#;
        let launch: LaunchToml = toml::from_str(toml_str).expect("should parse");
        assert_eq!(launch.arguments.len(), 2);
        assert!(matches!(
            launch.arguments[0].choices,
            Some(ChoicesToml::Discover { ref discover }) if discover.suffix == ".sdf"
        ));
        assert_eq!(launch.arguments[0].default, None);
        assert_eq!(
            launch.arguments[1].choices,
            Some(ChoicesToml::List(vec!["True".into(), "False".into()]))
        );
        assert_eq!(launch.units.len(), 2);
        assert!(matches!(launch.units[0], UnitToml::Node { ref executable, .. } if executable == "parameter_bridge"));
        assert!(matches!(launch.units[1], UnitToml::Include { ref path, .. } if path == "launch/gz_sim.launch.toml"));
    }

    #[test]
    fn empty_file_is_empty_description() {
        let launch: LaunchToml = toml::from_str("").unwrap();
        assert_eq!(launch, LaunchToml::default());
    }

    #[test]
    fn rejects_unknown_unit_type() {
        let result: Result<LaunchToml, _> = toml::from_str(
            r#"
[[units]]
type = "container"
executable = "x"
"#,
        );
        assert!(result.is_err());
    }
}
