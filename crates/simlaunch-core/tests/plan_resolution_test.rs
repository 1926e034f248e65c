//! Integration tests for building plans through the public API and
//! resolving their units.

use simlaunch_core::catalog::{ArgumentError, ArgumentValues, declare_argument, discover_choices, resolve_values};
use simlaunch_core::plan::{AssembleError, assemble};
use simlaunch_core::substitution::{ResolveError, Resolver, Substitution};
use simlaunch_core::unit::{NodeUnit, PlanLocator, Unit, make_included, make_node};
use simlaunch_test_utils::{PackageTree, ScriptedRunner};

fn choices(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

fn gui_flag() -> Substitution {
    Substitution::conditional(
        Substitution::equals(Substitution::arg("start_gui"), "True".into()),
        "".into(),
        "-s".into(),
    )
}

/// Two arguments and one node whose only parameter depends on the GUI flag.
fn gui_plan() -> simlaunch_core::plan::Plan {
    let arguments = vec![
        declare_argument(
            "world_name",
            "World to simulate",
            "forest",
            choices(&["forest", "desert"]),
        )
        .unwrap(),
        declare_argument("start_gui", "Start the GUI", "True", choices(&["True", "False"])).unwrap(),
    ];
    let node = make_node(
        NodeUnit::new(Some("sim".into()), "server"),
        vec![("gui_flag".to_owned(), gui_flag())],
    );
    assemble(arguments, vec![node]).unwrap()
}

fn resolve_gui_flag(overrides: &[(String, String)]) -> String {
    let plan = gui_plan();
    let values = resolve_values(plan.arguments(), overrides).unwrap();
    let Unit::Node(node) = &plan.units()[0] else {
        panic!("expected node");
    };
    Resolver::new(&values).resolve(&node.parameters[0].1).unwrap()
}

#[test]
fn gui_flag_follows_start_gui() {
    assert_eq!(
        resolve_gui_flag(&[("start_gui".to_owned(), "False".to_owned())]),
        "-s"
    );
    assert_eq!(
        resolve_gui_flag(&[("start_gui".to_owned(), "True".to_owned())]),
        ""
    );
    assert_eq!(resolve_gui_flag(&[]), "");
}

#[test]
fn override_outside_choices_is_rejected() {
    let plan = gui_plan();
    let err = resolve_values(
        plan.arguments(),
        &[("world_name".to_owned(), "ocean".to_owned())],
    )
    .unwrap_err();
    assert!(
        matches!(err, ArgumentError::ValueNotAllowed { ref name, ref value, .. } if name == "world_name" && value == "ocean"),
        "expected ValueNotAllowed, got: {err}"
    );
}

#[test]
fn override_of_undeclared_argument_is_rejected() {
    let plan = gui_plan();
    let err = resolve_values(plan.arguments(), &[("speed".to_owned(), "1".to_owned())])
        .unwrap_err();
    assert!(
        matches!(err, ArgumentError::UnknownArgument(ref n) if n == "speed"),
        "expected UnknownArgument, got: {err}"
    );
}

#[test]
fn only_the_selected_branch_runs_its_command() {
    let runner = ScriptedRunner::new()
        .with_output("gui", "gui-on")
        .with_output("headless", "gui-off");
    let node = Substitution::conditional(
        Substitution::arg("start_gui"),
        Substitution::command("gui", Vec::new()),
        Substitution::command("headless", Vec::new()),
    );

    let values: ArgumentValues = [("start_gui", "False")].into_iter().collect();
    let resolved = Resolver::new(&values).with_runner(&runner).resolve(&node).unwrap();

    assert_eq!(resolved, "gui-off");
    let ran: Vec<String> = runner.calls().into_iter().map(|(name, _)| name).collect();
    assert_eq!(ran, vec!["headless"]);
}

#[test]
fn malformed_predicate_is_an_error() {
    let values: ArgumentValues = [("start_gui", "maybe")].into_iter().collect();
    let predicate = Substitution::conditional(Substitution::arg("start_gui"), "".into(), " -s".into());
    let err = Resolver::new(&values).resolve(&predicate).unwrap_err();
    assert!(
        matches!(err, ResolveError::MalformedPredicate(ref token) if token == "maybe"),
        "expected MalformedPredicate, got: {err}"
    );
}

#[test]
fn sibling_include_does_not_declare_arguments() {
    let tree = PackageTree::new();
    tree.add_package("sim");
    tree.write_share_file(
        "sim",
        "launch/child.launch.toml",
        r#"
[[arguments]]
name = "x"
default = "1"
"#,
    );
    let packages = tree.index();

    let include = make_included(
        PlanLocator {
            package: "sim".into(),
            path: "launch/child.launch.toml".into(),
        },
        vec![("x".to_owned(), "2".into())],
        &packages,
    )
    .unwrap();
    let node = make_node(
        NodeUnit::new(None, "echo"),
        vec![("value".to_owned(), Substitution::arg("x"))],
    );

    let err = assemble(Vec::new(), vec![include, node]).unwrap_err();
    assert!(
        matches!(err, AssembleError::UndeclaredArgument { ref name, .. } if name == "x"),
        "expected UndeclaredArgument, got: {err}"
    );
}

#[test]
fn discovered_worlds_feed_argument_choices() {
    let tree = PackageTree::new();
    tree.add_package("sim");
    tree.write_share_file("sim", "worlds/forest.sdf", "");
    tree.write_share_file("sim", "worlds/desert.sdf", "");
    tree.write_share_file("sim", "worlds/README.md", "");

    let worlds = tree.index().share_dir("sim").unwrap().join("worlds");
    let mut found = discover_choices(&worlds, ".sdf").unwrap();
    let first = found[0].clone();

    let argument = declare_argument("world_name", "", first.clone(), found.clone()).unwrap();
    assert_eq!(argument.default_value(), first);

    found.sort();
    assert_eq!(found, vec!["desert", "forest"]);
}

#[test]
fn path_join_uses_platform_separator() {
    let values: ArgumentValues = [("x", "b")].into_iter().collect();
    let joined = Resolver::new(&values)
        .resolve(&Substitution::path_join(["a".into(), Substitution::arg("x")]))
        .unwrap();
    assert_eq!(joined, std::path::Path::new("a").join("b").to_string_lossy());
}
