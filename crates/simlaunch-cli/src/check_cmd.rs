//! `simlaunch check` command: load and validate a launch description
//! without resolving or starting anything.

use anyhow::{Context, Result};

use simlaunch_core::catalog::resolve_values;
use simlaunch_core::package::PackageIndex;
use simlaunch_core::plan::Plan;
use simlaunch_core::unit::Unit;

use crate::resolve::{LaunchTarget, collect_overrides};

/// Run the check command.
///
/// Overrides are validated against the declared arguments. With `json`,
/// the assembled plan is printed as JSON.
pub fn run_check(target: &LaunchTarget, packages: &PackageIndex, json: bool) -> Result<()> {
    let plan = target.load(packages)?;
    let overrides = collect_overrides(plan.arguments(), &target.overrides, |key| {
        std::env::var(key).ok()
    })?;
    resolve_values(plan.arguments(), &overrides).context("invalid arguments")?;

    if json {
        println!("{}", render_json(&plan)?);
    } else {
        print!("{}", render_summary(&plan));
        println!("{}: ok", target.file.display());
    }
    Ok(())
}

pub fn render_json(plan: &Plan) -> Result<String> {
    serde_json::to_string_pretty(plan).context("failed to serialize plan")
}

/// One line per argument and unit, in plan order.
pub fn render_summary(plan: &Plan) -> String {
    let mut out = format!(
        "{} argument(s), {} unit(s)\n",
        plan.arguments().len(),
        plan.units().len()
    );
    for argument in plan.arguments() {
        out.push_str(&format!(
            "  arg     {} (default: {})\n",
            argument.name(),
            argument.default_value()
        ));
    }
    for unit in plan.units() {
        let kind = match unit {
            Unit::Node(_) => "node",
            Unit::Include(_) => "include",
        };
        out.push_str(&format!("  {kind:<7} {}\n", unit.label()));
    }
    out
}
