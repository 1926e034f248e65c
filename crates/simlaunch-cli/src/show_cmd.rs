//! `simlaunch show` command: resolve a launch description and print the
//! processes it would start, without starting them.
//!
//! Command substitutions are still run, since their output is part of the
//! resolved command lines.

use anyhow::{Context, Result};

use simlaunch_core::launch::{DryRunSpawner, LaunchContext, ProcessSpec, launch};
use simlaunch_core::package::PackageIndex;

use crate::resolve::{LaunchTarget, collect_overrides};

/// Run the show command.
pub fn run_show(target: &LaunchTarget, packages: &PackageIndex) -> Result<()> {
    let specs = dry_run(target, packages, LaunchContext::new(packages))?;
    print!("{}", render_specs(&specs));
    Ok(())
}

/// Resolve every process of `target` in launch order.
pub fn dry_run(
    target: &LaunchTarget,
    packages: &PackageIndex,
    context: LaunchContext<'_>,
) -> Result<Vec<ProcessSpec>> {
    let plan = target.load(packages)?;
    let overrides = collect_overrides(plan.arguments(), &target.overrides, |key| {
        std::env::var(key).ok()
    })?;

    let mut spawner = DryRunSpawner::new();
    launch(&plan, &overrides, context, &mut spawner)
        .with_context(|| format!("failed to resolve {}", target.file.display()))?;
    Ok(spawner.into_specs())
}

pub fn render_specs(specs: &[ProcessSpec]) -> String {
    if specs.is_empty() {
        return "No processes.\n".to_owned();
    }
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| format!("[{}] {}\n    {}\n", index + 1, spec.label, spec.command_line()))
        .collect()
}
