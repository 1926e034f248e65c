//! Launch target and argument override resolution.
//!
//! A target is given on the command line either as a path to a
//! `*.launch.toml` file or as `<package> <file>`, where the file is looked
//! up in the package's `launch/` directory. Everything after the target is
//! an argument override, `name:=value`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use simlaunch_core::catalog::{Argument, parse_override};
use simlaunch_core::package::PackageIndex;
use simlaunch_core::plan::{Plan, load_plan};

/// Prefix of environment variables that override top-level arguments.
pub const ARG_ENV_PREFIX: &str = "SIMLAUNCH_ARG_";

/// A located launch description plus the raw overrides that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub file: PathBuf,
    pub overrides: Vec<String>,
}

impl LaunchTarget {
    /// Load the launch description.
    pub fn load(&self, packages: &PackageIndex) -> Result<Plan> {
        load_plan(&self.file, packages)
            .with_context(|| format!("failed to load {}", self.file.display()))
    }
}

/// Split the positional words of a launch command into a target file and
/// overrides.
pub fn resolve_target(words: &[String], packages: &PackageIndex) -> Result<LaunchTarget> {
    let Some((first, rest)) = words.split_first() else {
        bail!("missing launch target: pass a file path or `<package> <file>`");
    };

    if looks_like_file_path(first) {
        let file = PathBuf::from(first);
        if !file.is_file() {
            bail!("launch description not found: {}", file.display());
        }
        return Ok(LaunchTarget {
            file,
            overrides: rest.to_vec(),
        });
    }

    let package = first;
    let Some((name, overrides)) = rest.split_first().filter(|(name, _)| !is_override(name)) else {
        bail!("missing launch file name after package {package:?}");
    };

    let file = find_in_package(packages, package, name)?;
    Ok(LaunchTarget {
        file,
        overrides: overrides.to_vec(),
    })
}

/// Heuristic: a path separator, a `.toml` suffix, or an existing file.
fn looks_like_file_path(word: &str) -> bool {
    word.contains(std::path::is_separator) || word.ends_with(".toml") || Path::new(word).is_file()
}

fn is_override(word: &str) -> bool {
    word.contains(":=")
}

fn find_in_package(packages: &PackageIndex, package: &str, name: &str) -> Result<PathBuf> {
    if packages.share_dir(package).is_none() {
        bail!(
            "package {package:?} not found in any install prefix ({})",
            describe_prefixes(packages)
        );
    }

    packages
        .share_file(package, Path::new("launch").join(name))
        .or_else(|| packages.share_file(package, name))
        .with_context(|| format!("launch file {name:?} not found in package {package:?}"))
}

fn describe_prefixes(packages: &PackageIndex) -> String {
    if packages.prefixes().is_empty() {
        return "none configured".to_owned();
    }
    packages
        .prefixes()
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the override list for `arguments`: environment overrides first,
/// then the command-line ones, so the command line wins.
///
/// `lookup_env` is called with `SIMLAUNCH_ARG_<NAME>` for each declared
/// argument, the name upper-cased.
pub fn collect_overrides(
    arguments: &[Argument],
    cli_overrides: &[String],
    lookup_env: impl Fn(&str) -> Option<String>,
) -> Result<Vec<(String, String)>> {
    let mut overrides: Vec<(String, String)> = arguments
        .iter()
        .filter_map(|argument| {
            let key = env_key(argument.name());
            lookup_env(&key).map(|value| {
                tracing::debug!(argument = argument.name(), env = %key, "argument set from environment");
                (argument.name().to_owned(), value)
            })
        })
        .collect();

    for raw in cli_overrides {
        let parsed = parse_override(raw).with_context(|| format!("invalid argument {raw:?}"))?;
        overrides.push(parsed);
    }

    Ok(overrides)
}

/// Environment variable consulted for argument `name`.
pub fn env_key(name: &str) -> String {
    format!("{ARG_ENV_PREFIX}{}", name.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simlaunch_core::catalog::{declare_argument, resolve_values};
    use tempfile::TempDir;

    fn words(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn prefix_with_launch_file() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let launch = tmp.path().join("share/sim/launch");
        std::fs::create_dir_all(&launch).unwrap();
        std::fs::write(launch.join("world.launch.toml"), "").unwrap();
        tmp
    }

    #[test]
    fn file_path_target() {
        let tmp = prefix_with_launch_file();
        let file = tmp.path().join("share/sim/launch/world.launch.toml");
        let target = resolve_target(
            &words(&[file.to_str().unwrap(), "gui:=False"]),
            &PackageIndex::default(),
        )
        .unwrap();
        assert_eq!(target.file, file);
        assert_eq!(target.overrides, vec!["gui:=False"]);
    }

    #[test]
    fn missing_file_path_target() {
        let err = resolve_target(
            &words(&["/nonexistent/world.launch.toml"]),
            &PackageIndex::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"), "unexpected error: {err}");
    }

    #[test]
    fn package_target() {
        let tmp = prefix_with_launch_file();
        let packages = PackageIndex::new([tmp.path()]);
        let target = resolve_target(
            &words(&["sim", "world.launch.toml", "world_name:=desert"]),
            &packages,
        )
        .unwrap();
        assert_eq!(target.file, tmp.path().join("share/sim/launch/world.launch.toml"));
        assert_eq!(target.overrides, vec!["world_name:=desert"]);
    }

    #[test]
    fn package_target_needs_file_name() {
        let tmp = prefix_with_launch_file();
        let packages = PackageIndex::new([tmp.path()]);
        let err = resolve_target(&words(&["sim", "gui:=False"]), &packages).unwrap_err();
        assert!(
            err.to_string().contains("missing launch file name"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn unknown_package_lists_prefixes() {
        let err = resolve_target(&words(&["ghost", "x.launch"]), &PackageIndex::default())
            .unwrap_err();
        assert!(err.to_string().contains("none configured"), "unexpected error: {err}");
    }

    #[test]
    fn empty_target_is_an_error() {
        assert!(resolve_target(&[], &PackageIndex::default()).is_err());
    }

    #[test]
    fn cli_overrides_win_over_environment() {
        let arguments = vec![
            declare_argument("world_name", "", "forest", Vec::new()).unwrap(),
            declare_argument("start_gui", "", "True", Vec::new()).unwrap(),
        ];
        let env = |key: &str| match key {
            "SIMLAUNCH_ARG_WORLD_NAME" => Some("desert".to_owned()),
            "SIMLAUNCH_ARG_START_GUI" => Some("False".to_owned()),
            _ => None,
        };

        let overrides =
            collect_overrides(&arguments, &words(&["start_gui:=True"]), env).unwrap();
        assert_eq!(
            overrides,
            vec![
                ("world_name".to_owned(), "desert".to_owned()),
                ("start_gui".to_owned(), "False".to_owned()),
                ("start_gui".to_owned(), "True".to_owned()),
            ]
        );
    }

    #[test]
    fn stale_environment_value_does_not_block_cli_value() {
        let arguments = vec![
            declare_argument("start_gui", "", "True", vec!["True".into(), "False".into()]).unwrap(),
        ];
        let env = |key: &str| (key == "SIMLAUNCH_ARG_START_GUI").then(|| "maybe".to_owned());

        let overrides =
            collect_overrides(&arguments, &words(&["start_gui:=False"]), env).unwrap();
        let values = resolve_values(&arguments, &overrides).unwrap();
        assert_eq!(values.get("start_gui"), Some("False"));
    }

    #[test]
    fn malformed_override_is_rejected() {
        let err = collect_overrides(&[], &words(&["no-separator"]), |_| None).unwrap_err();
        assert!(
            format!("{err:#}").contains("invalid argument"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn env_key_is_upper_cased() {
        assert_eq!(env_key("world_name"), "SIMLAUNCH_ARG_WORLD_NAME");
    }
}
