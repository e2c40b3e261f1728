use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::diff;
use crate::host::{HostError, ScenarioHost};
use crate::refstore::{DiffStore, RefStore, StoreError};

/// Which references an operator asked to re-baseline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateMode {
    #[default]
    None,
    /// Re-baseline one scenario, matched by exact name.
    Scenario(String),
    All,
}

impl UpdateMode {
    pub fn applies_to(&self, scenario: &str) -> bool {
        match self {
            UpdateMode::None => false,
            UpdateMode::Scenario(name) => name == scenario,
            UpdateMode::All => true,
        }
    }
}

/// Verdict for one scenario after both frames are reconciled.
///
/// Precedence: a scenario with any unreconciled diff is `Changed`, even
/// if its other frame was freshly written; `Created` covers first
/// encounters and re-baselines; `Unchanged` means both frames matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Unchanged,
    Created,
    Changed,
}

impl Verdict {
    /// One-character progress mark, in the traditional dot/plus/cross style.
    pub fn mark(self) -> char {
        match self {
            Verdict::Unchanged => '.',
            Verdict::Created => '+',
            Verdict::Changed => 'x',
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub verdict: Verdict,
}

/// Everything a caller needs to print a summary and pick an exit code.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    /// The run succeeds iff no scenario changed.
    pub fn passed(&self) -> bool {
        self.changed().is_empty()
    }

    pub fn changed(&self) -> Vec<&str> {
        self.with_verdict(Verdict::Changed)
    }

    pub fn created(&self) -> Vec<&str> {
        self.with_verdict(Verdict::Created)
    }

    fn with_verdict(&self, verdict: Verdict) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.verdict == verdict)
            .map(|outcome| outcome.scenario.as_str())
            .collect()
    }

    /// Progress marks in scenario order, e.g. `..x+.`.
    pub fn marks(&self) -> String {
        self.outcomes
            .iter()
            .map(|outcome| outcome.verdict.mark())
            .collect()
    }
}

/// Configuration for one harness run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Discrete steps between the first and second captured frames.
    pub frames: u32,
    pub update: UpdateMode,
    /// Persist diff logs for frames that differ from their reference.
    pub write_diffs: bool,
    pub refs_root: PathBuf,
    pub diffs_root: PathBuf,
}

impl RunOptions {
    pub fn new(refs_root: impl Into<PathBuf>, diffs_root: impl Into<PathBuf>) -> Self {
        Self {
            frames: 10,
            update: UpdateMode::None,
            write_diffs: false,
            refs_root: refs_root.into(),
            diffs_root: diffs_root.into(),
        }
    }
}

/// A fatal harness failure. Scenario verdicts never end up here — only
/// host failures and reference-store I/O do.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Default)]
struct FrameReconciliation {
    created: bool,
    changed: bool,
}

/// Drive every scenario the host advertises and reconcile both captured
/// frames against stored references.
///
/// Scenarios run strictly sequentially (they share the host's world) and
/// any host or store failure aborts the whole run immediately; partial
/// reference writes from earlier scenarios are left in place.
pub fn run(host: &mut dyn ScenarioHost, options: &RunOptions) -> Result<RunReport, RunError> {
    host.connect()?;
    let scenarios = host.scenario_names();

    let refs = RefStore::new(&options.refs_root);
    let diffs = DiffStore::new(&options.diffs_root);
    diffs.clear()?;
    if options.write_diffs {
        diffs.prepare()?;
    }

    let mut report = RunReport::default();
    for scenario in scenarios {
        host.load_scenario(&scenario)?;
        let start = host.capture().encode();
        for _ in 0..options.frames {
            host.step()?;
        }
        let end = host.capture().encode();

        let first = reconcile_frame(&refs, &diffs, options, &scenario, 0, &start)?;
        let last = reconcile_frame(&refs, &diffs, options, &scenario, options.frames, &end)?;

        let verdict = if first.changed || last.changed {
            Verdict::Changed
        } else if first.created || last.created {
            Verdict::Created
        } else {
            Verdict::Unchanged
        };
        tracing::debug!(%scenario, ?verdict, "scenario reconciled");
        report.outcomes.push(ScenarioOutcome { scenario, verdict });
    }
    Ok(report)
}

fn reconcile_frame(
    refs: &RefStore,
    diffs: &DiffStore,
    options: &RunOptions,
    scenario: &str,
    frame: u32,
    captured: &Value,
) -> Result<FrameReconciliation, RunError> {
    let Some(reference) = refs.load(scenario, frame)? else {
        refs.save(scenario, frame, captured)?;
        return Ok(FrameReconciliation {
            created: true,
            changed: false,
        });
    };

    let ops = diff::diff(&reference, captured);
    if ops.is_empty() {
        return Ok(FrameReconciliation::default());
    }

    if options.write_diffs {
        diffs.save(scenario, frame, &ops)?;
    }
    if options.update.applies_to(scenario) {
        refs.save(scenario, frame, captured)?;
        return Ok(FrameReconciliation {
            created: true,
            changed: false,
        });
    }
    Ok(FrameReconciliation {
        created: false,
        changed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(verdicts: &[(&str, Verdict)]) -> RunReport {
        RunReport {
            outcomes: verdicts
                .iter()
                .map(|(name, verdict)| ScenarioOutcome {
                    scenario: name.to_string(),
                    verdict: *verdict,
                })
                .collect(),
        }
    }

    #[test]
    fn update_mode_matching() {
        let one = UpdateMode::Scenario("stack".to_string());
        assert!(one.applies_to("stack"));
        assert!(!one.applies_to("stacked"));
        assert!(!UpdateMode::None.applies_to("stack"));
        assert!(UpdateMode::All.applies_to("anything"));
    }

    #[test]
    fn pass_is_the_or_of_changed_flags() {
        let clean = report(&[("a", Verdict::Unchanged), ("b", Verdict::Created)]);
        assert!(clean.passed());

        let dirty = report(&[
            ("ragdoll", Verdict::Unchanged),
            ("stack", Verdict::Changed),
        ]);
        assert!(!dirty.passed());
        assert_eq!(dirty.changed(), vec!["stack"]);
    }

    #[test]
    fn marks_follow_scenario_order() {
        let mixed = report(&[
            ("a", Verdict::Unchanged),
            ("b", Verdict::Changed),
            ("c", Verdict::Created),
        ]);
        assert_eq!(mixed.marks(), ".x+");
    }

    #[test]
    fn default_options_use_ten_frames() {
        let options = RunOptions::new("refs", "diffs");
        assert_eq!(options.frames, 10);
        assert_eq!(options.update, UpdateMode::None);
        assert!(!options.write_diffs);
    }
}
