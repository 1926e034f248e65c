//! `simlaunch args` command: list the arguments a launch description declares.

use std::fmt::Write as _;

use anyhow::Result;

use simlaunch_core::package::PackageIndex;
use simlaunch_core::plan::Plan;

use crate::resolve::{LaunchTarget, env_key};

/// Run the args command.
pub fn run_args(target: &LaunchTarget, packages: &PackageIndex) -> Result<()> {
    let plan = target.load(packages)?;
    print!("{}", render_arguments(&plan));
    Ok(())
}

/// Format the argument listing for `plan`.
pub fn render_arguments(plan: &Plan) -> String {
    let mut out = String::new();
    if plan.arguments().is_empty() {
        out.push_str("No arguments.\n");
        return out;
    }

    out.push_str("Arguments (pass arguments as '<name>:=<value>'):\n");
    for argument in plan.arguments() {
        let _ = writeln!(out);
        let _ = writeln!(out, "    '{}':", argument.name());
        if !argument.description().is_empty() {
            let _ = writeln!(out, "        {}", argument.description());
        }
        if !argument.allowed().is_empty() {
            let _ = writeln!(out, "        Choices: {}", argument.allowed().join(", "));
        }
        let _ = writeln!(out, "        (default: '{}')", argument.default_value());
        let _ = writeln!(out, "        (env: {})", env_key(argument.name()));
    }
    out
}
