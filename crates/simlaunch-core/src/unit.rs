//! Unit descriptors: the launchable entries of a plan.
//!
//! Units are plain values. Constructing one never resolves a substitution;
//! parameters keep their unresolved form until launch time.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::package::PackageIndex;
use crate::substitution::Substitution;

/// Errors raised while constructing units.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("included launch description {path:?} not found in package {package:?}")]
    UnknownPlan { package: String, path: PathBuf },
}

/// A process to start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeUnit {
    /// Package providing the executable. `None` means search `PATH`.
    pub package: Option<String>,
    pub executable: String,
    /// Node name passed as a `__node` remapping.
    pub name: Option<String>,
    /// Command-line arguments placed before the ROS arguments.
    pub arguments: Vec<Substitution>,
    /// Parameters in declaration order.
    pub parameters: Vec<(String, Substitution)>,
}

impl NodeUnit {
    pub fn new(package: Option<String>, executable: impl Into<String>) -> Self {
        Self {
            package,
            executable: executable.into(),
            name: None,
            arguments: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Set the node name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the command-line arguments.
    pub fn arguments(mut self, arguments: Vec<Substitution>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Append a parameter.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Substitution>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Human-readable label used in logs and errors.
    pub fn label(&self) -> String {
        match (&self.name, &self.package) {
            (Some(name), _) => name.clone(),
            (None, Some(package)) => format!("{package}/{}", self.executable),
            (None, None) => self.executable.clone(),
        }
    }
}

/// Where an included launch description lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanLocator {
    pub package: String,
    /// Path relative to the package's share directory.
    pub path: PathBuf,
}

impl std::fmt::Display for PlanLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.package, self.path.display())
    }
}

/// Another launch description spliced in with argument overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncludeUnit {
    pub locator: PlanLocator,
    /// Location on disk, checked to exist when the unit was built.
    pub file: PathBuf,
    /// Values for the included description's arguments.
    pub arguments: Vec<(String, Substitution)>,
}

/// One launchable entry of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Unit {
    Node(NodeUnit),
    Include(IncludeUnit),
}

impl Unit {
    pub fn label(&self) -> String {
        match self {
            Self::Node(node) => node.label(),
            Self::Include(include) => include.locator.to_string(),
        }
    }

    /// Names of every argument referenced by this unit, depth-first.
    ///
    /// For includes only the override values are walked; the included
    /// description's own references belong to its own scope.
    pub fn argument_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        match self {
            Self::Node(node) => {
                for argument in &node.arguments {
                    argument.argument_refs(&mut refs);
                }
                for (_, value) in &node.parameters {
                    value.argument_refs(&mut refs);
                }
            }
            Self::Include(include) => {
                for (_, value) in &include.arguments {
                    value.argument_refs(&mut refs);
                }
            }
        }
        refs
    }
}

/// Build a node unit from a target and its parameters.
pub fn make_node(target: NodeUnit, parameters: Vec<(String, Substitution)>) -> Unit {
    let mut node = target;
    node.parameters.extend(parameters);
    Unit::Node(node)
}

/// Build an include unit, checking that the referenced file exists.
///
/// The file's contents are not read here.
pub fn make_included(
    locator: PlanLocator,
    arguments: Vec<(String, Substitution)>,
    packages: &PackageIndex,
) -> Result<Unit, UnitError> {
    let file = packages
        .share_file(&locator.package, &locator.path)
        .ok_or_else(|| UnitError::UnknownPlan {
            package: locator.package.clone(),
            path: locator.path.clone(),
        })?;

    Ok(Unit::Include(IncludeUnit {
        locator,
        file,
        arguments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn prefix_with_launch_file() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let launch = tmp.path().join("share/sim/launch");
        std::fs::create_dir_all(&launch).unwrap();
        std::fs::write(launch.join("gz.launch.toml"), "").unwrap();
        tmp
    }

    #[test]
    fn make_node_keeps_parameters_unresolved() {
        let unit = make_node(
            NodeUnit::new(Some("robot_state_publisher".into()), "robot_state_publisher"),
            vec![
                ("use_sim_time".into(), "true".into()),
                ("robot_description".into(), Substitution::command("xacro", vec![Substitution::arg("model")])),
            ],
        );

        let Unit::Node(node) = &unit else {
            panic!("expected node unit");
        };
        assert_eq!(node.parameters.len(), 2);
        assert_eq!(node.parameters[0].0, "use_sim_time");
        assert!(matches!(node.parameters[1].1, Substitution::Command { .. }));
        assert_eq!(unit.argument_refs(), vec!["model"]);
    }

    #[test]
    fn make_node_appends_after_builder_parameters() {
        let unit = make_node(
            NodeUnit::new(None, "parameter_bridge").parameter("first", "1"),
            vec![("second".into(), "2".into())],
        );
        let Unit::Node(node) = unit else {
            panic!("expected node unit");
        };
        let keys: Vec<&str> = node.parameters.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["first", "second"]);
    }

    #[test]
    fn node_refs_cover_arguments_and_parameters() {
        let unit = Unit::Node(
            NodeUnit::new(None, "create")
                .arguments(vec!["-name".into(), Substitution::arg("robot")])
                .parameter("use_sim_time", Substitution::arg("sim_time")),
        );
        assert_eq!(unit.argument_refs(), vec!["robot", "sim_time"]);
    }

    #[test]
    fn labels() {
        assert_eq!(NodeUnit::new(Some("pkg".into()), "exe").label(), "pkg/exe");
        assert_eq!(NodeUnit::new(None, "exe").label(), "exe");
        assert_eq!(
            NodeUnit::new(Some("pkg".into()), "exe").name("spawn_robot").label(),
            "spawn_robot"
        );
    }

    #[test]
    fn make_included_checks_existence() {
        let tmp = prefix_with_launch_file();
        let packages = PackageIndex::new([tmp.path()]);
        let locator = PlanLocator {
            package: "sim".into(),
            path: "launch/gz.launch.toml".into(),
        };

        let unit = make_included(
            locator.clone(),
            vec![("gz_args".into(), Substitution::arg("world"))],
            &packages,
        )
        .expect("launch file exists");

        let Unit::Include(include) = &unit else {
            panic!("expected include unit");
        };
        assert_eq!(include.file, tmp.path().join("share/sim/launch/gz.launch.toml"));
        assert_eq!(include.locator, locator);
        assert_eq!(unit.label(), "sim/launch/gz.launch.toml");
        assert_eq!(unit.argument_refs(), vec!["world"]);
    }

    #[test]
    fn make_included_rejects_missing_file() {
        let tmp = prefix_with_launch_file();
        let packages = PackageIndex::new([tmp.path()]);

        for (package, path) in [("sim", "launch/other.launch.toml"), ("nope", "launch/gz.launch.toml")] {
            let err = make_included(
                PlanLocator {
                    package: package.into(),
                    path: path.into(),
                },
                Vec::new(),
                &packages,
            )
            .unwrap_err();
            assert!(
                matches!(err, UnitError::UnknownPlan { package: ref p, .. } if p == package),
                "expected UnknownPlan, got: {err}"
            );
        }
    }
}
