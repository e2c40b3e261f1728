//! End-to-end runs of the harness against the built-in demo host.

use sim_tools::engine::DemoHost;
use sim_tools::runner::{RunOptions, UpdateMode, run};

fn options(root: &std::path::Path) -> RunOptions {
    RunOptions::new(root.join("refs"), root.join("diffs"))
}

#[test]
fn fresh_references_then_a_clean_second_run() {
    let dir = tempfile::tempdir().unwrap();

    let report = run(&mut DemoHost::standard(), &options(dir.path())).unwrap();
    assert_eq!(report.marks(), "+++");
    assert_eq!(report.created(), vec!["pendulum", "shower", "stack"]);
    assert!(report.passed());

    // The demos are deterministic, so a brand-new host reproduces the
    // captures exactly.
    let report = run(&mut DemoHost::standard(), &options(dir.path())).unwrap();
    assert_eq!(report.marks(), "...");
    assert!(report.passed());
}

#[test]
fn drifted_demo_is_caught_and_can_be_rebaselined() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut DemoHost::standard(), &options(dir.path())).unwrap();

    // Drift one demo by rebuilding it under different gravity.
    let mut drifted = DemoHost::standard();
    drifted.register("stack", |engine| {
        engine.world.gravity.y = 2.0;
        engine.world.add_body(
            sim_tools::engine::Body::polygon(sim_tools::engine::Vec2::new(400.0, 600.0), 4, 800.0)
                .fixed(),
        );
    });

    let report = run(&mut drifted, &options(dir.path())).unwrap();
    assert_eq!(report.changed(), vec!["stack"]);
    assert!(!report.passed());

    let mut rebaseline = options(dir.path());
    rebaseline.update = UpdateMode::Scenario("stack".to_string());
    let mut drifted = DemoHost::standard();
    drifted.register("stack", |engine| {
        engine.world.gravity.y = 2.0;
        engine.world.add_body(
            sim_tools::engine::Body::polygon(sim_tools::engine::Vec2::new(400.0, 600.0), 4, 800.0)
                .fixed(),
        );
    });
    let report = run(&mut drifted, &rebaseline).unwrap();
    assert_eq!(report.created(), vec!["stack"]);
    assert!(report.passed());
}

#[test]
fn frame_count_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = options(dir.path());
    options.frames = 3;

    run(&mut DemoHost::standard(), &options).unwrap();
    assert!(dir.path().join("refs/stack/stack-0.json").exists());
    assert!(dir.path().join("refs/stack/stack-3.json").exists());
    assert!(!dir.path().join("refs/stack/stack-10.json").exists());
}
