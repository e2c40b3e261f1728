use std::fs;
use std::path::Path;

use sim_tools::host::HostError;
use sim_tools::runner::{RunError, RunOptions, UpdateMode, Verdict, run};
use sim_tools::testutil::ScriptedHost;

fn options(root: &Path) -> RunOptions {
    RunOptions::new(root.join("refs"), root.join("diffs"))
}

fn reference(root: &Path, scenario: &str, frame: u32) -> serde_json::Value {
    let path = root
        .join("refs")
        .join(scenario)
        .join(format!("{scenario}-{frame}.json"));
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn first_run_creates_exactly_two_references_per_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = ScriptedHost::new(&["ragdoll", "stack"]);

    let report = run(&mut host, &options(dir.path())).unwrap();

    assert!(report.passed());
    assert_eq!(report.created(), vec!["ragdoll", "stack"]);
    assert!(report.changed().is_empty());
    assert_eq!(report.marks(), "++");

    for scenario in ["ragdoll", "stack"] {
        let scenario_dir = dir.path().join("refs").join(scenario);
        let files: Vec<_> = fs::read_dir(&scenario_dir).unwrap().collect();
        assert_eq!(files.len(), 2, "expected exactly two files for {scenario}");
        assert_eq!(reference(dir.path(), scenario, 0)["steps"], 0);
        assert_eq!(reference(dir.path(), scenario, 10)["steps"], 10);
    }
}

#[test]
fn matching_references_report_unchanged_and_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut ScriptedHost::new(&["stack"]), &options(dir.path())).unwrap();
    let before = reference(dir.path(), "stack", 10);

    let report = run(&mut ScriptedHost::new(&["stack"]), &options(dir.path())).unwrap();

    assert!(report.passed());
    assert_eq!(report.marks(), ".");
    assert_eq!(report.outcomes[0].verdict, Verdict::Unchanged);
    assert_eq!(reference(dir.path(), "stack", 10), before);
    assert!(!dir.path().join("diffs").exists());
}

#[test]
fn changed_capture_reports_changed_and_leaves_reference_untouched() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut ScriptedHost::new(&["stack"]), &options(dir.path())).unwrap();

    let mut drifted = ScriptedHost::new(&["stack"]).with_salt(1);
    let report = run(&mut drifted, &options(dir.path())).unwrap();

    assert!(!report.passed());
    assert_eq!(report.changed(), vec!["stack"]);
    assert_eq!(report.marks(), "x");
    // References round-trip untouched: still the salt-0 capture.
    assert_eq!(reference(dir.path(), "stack", 0)["salt"], 0);
    assert_eq!(reference(dir.path(), "stack", 10)["salt"], 0);
}

#[test]
fn diff_flag_writes_nonempty_patch_files() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut ScriptedHost::new(&["stack"]), &options(dir.path())).unwrap();

    let mut with_diffs = options(dir.path());
    with_diffs.write_diffs = true;
    let report = run(&mut ScriptedHost::new(&["stack"]).with_salt(1), &with_diffs).unwrap();
    assert!(!report.passed());

    for frame in [0, 10] {
        let path = dir
            .path()
            .join("diffs")
            .join("stack")
            .join(format!("stack-{frame}.json"));
        let ops: Vec<sim_tools::PatchOp> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!ops.is_empty(), "expected a non-empty diff at frame {frame}");
    }
}

#[test]
fn stale_diffs_are_cleared_at_run_start() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("diffs").join("stack");
    fs::create_dir_all(&stale).unwrap();
    fs::write(stale.join("stack-0.json"), "[]").unwrap();

    run(&mut ScriptedHost::new(&["stack"]), &options(dir.path())).unwrap();

    assert!(!dir.path().join("diffs").exists());
}

#[test]
fn update_rebaselines_and_a_second_run_is_clean() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut ScriptedHost::new(&["stack"]), &options(dir.path())).unwrap();

    let mut rebaseline = options(dir.path());
    rebaseline.update = UpdateMode::Scenario("stack".to_string());
    let report = run(&mut ScriptedHost::new(&["stack"]).with_salt(1), &rebaseline).unwrap();

    assert!(report.passed());
    assert_eq!(report.created(), vec!["stack"]);
    assert_eq!(reference(dir.path(), "stack", 0)["salt"], 1);

    // Idempotence: immediately re-running the drifted host is now clean.
    let report = run(&mut ScriptedHost::new(&["stack"]).with_salt(1), &options(dir.path())).unwrap();
    assert_eq!(report.marks(), ".");
}

#[test]
fn update_only_covers_the_named_scenario() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut ScriptedHost::new(&["ragdoll", "stack"]), &options(dir.path())).unwrap();

    let mut rebaseline = options(dir.path());
    rebaseline.update = UpdateMode::Scenario("stack".to_string());
    let report = run(
        &mut ScriptedHost::new(&["ragdoll", "stack"]).with_salt(1),
        &rebaseline,
    )
    .unwrap();

    assert_eq!(report.changed(), vec!["ragdoll"]);
    assert_eq!(report.created(), vec!["stack"]);
    assert!(!report.passed());
}

#[test]
fn update_all_rebaselines_every_scenario() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut ScriptedHost::new(&["ragdoll", "stack"]), &options(dir.path())).unwrap();

    let mut rebaseline = options(dir.path());
    rebaseline.update = UpdateMode::All;
    let report = run(
        &mut ScriptedHost::new(&["ragdoll", "stack"]).with_salt(1),
        &rebaseline,
    )
    .unwrap();
    assert!(report.passed());
    assert_eq!(report.marks(), "++");

    let report = run(
        &mut ScriptedHost::new(&["ragdoll", "stack"]).with_salt(1),
        &options(dir.path()),
    )
    .unwrap();
    assert_eq!(report.marks(), "..");
}

#[test]
fn overall_verdict_is_the_or_of_per_scenario_changes() {
    let dir = tempfile::tempdir().unwrap();
    run(&mut ScriptedHost::new(&["ragdoll", "stack"]), &options(dir.path())).unwrap();

    // Sabotage only stack's frame-0 reference.
    let path = dir.path().join("refs").join("stack").join("stack-0.json");
    let mut doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc["salt"] = serde_json::json!(99);
    fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

    let report = run(&mut ScriptedHost::new(&["ragdoll", "stack"]), &options(dir.path())).unwrap();

    assert!(!report.passed());
    assert_eq!(report.changed(), vec!["stack"]);
    assert_eq!(report.marks(), ".x");
}

#[test]
fn unreachable_host_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = ScriptedHost::new(&["stack"]).failing_connect();
    match run(&mut host, &options(dir.path())) {
        Err(RunError::Host(HostError::Unreachable(_))) => {}
        other => panic!("expected Unreachable, got {other:?}"),
    }
    assert!(!dir.path().join("refs").exists());
}

#[test]
fn unknown_scenario_aborts_but_keeps_earlier_references() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = ScriptedHost::new(&["stack"]).advertising_unregistered("ghost");
    match run(&mut host, &options(dir.path())) {
        Err(RunError::Host(HostError::UnknownScenario(name))) => assert_eq!(name, "ghost"),
        other => panic!("expected UnknownScenario, got {other:?}"),
    }
    // The scenario that ran before the failure keeps its references.
    assert!(dir.path().join("refs").join("stack").join("stack-0.json").exists());
}

#[test]
fn step_failure_reports_scenario_and_location() {
    let dir = tempfile::tempdir().unwrap();
    let mut host = ScriptedHost::new(&["stack"]).failing_step("stack");
    let err = run(&mut host, &options(dir.path())).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("'stack'"), "missing scenario in: {text}");
    assert!(text.contains("scripted.rs: 7"), "missing location in: {text}");
}
