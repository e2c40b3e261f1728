use std::fmt;

use thiserror::Error;

use crate::snapshot::Snapshot;

/// Where a scenario failure originated, when the host can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub function: Option<String>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.line)?;
        if let Some(function) = &self.function {
            write!(f, " (fn: {function})")?;
        }
        Ok(())
    }
}

/// Failures surfaced by a simulation host. All of these are fatal to a
/// harness run; none are retried.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host never became ready. Check that it is actually running.
    #[error("host is unreachable: {0}")]
    Unreachable(String),

    /// The requested scenario name is not registered on the host.
    #[error("'{0}' is not a registered scenario")]
    UnknownScenario(String),

    /// A runtime error escaped while stepping a scenario.
    #[error("error while stepping '{scenario}': {message}{}", fmt_location(.location))]
    Step {
        scenario: String,
        message: String,
        location: Option<SourceLocation>,
    },

    /// An auxiliary resource the host needed failed to load.
    #[error("resource '{resource}' failed to load with status {status}")]
    ResourceLoad { resource: String, status: u16 },
}

fn fmt_location(location: &Option<SourceLocation>) -> String {
    match location {
        Some(location) => format!("\n -> {location}"),
        None => String::new(),
    }
}

/// A running simulation that the regression harness can drive.
///
/// Scenarios share one world, so execution is strictly sequential: every
/// [`load_scenario`](ScenarioHost::load_scenario) resets shared state
/// before invoking the named setup, and [`step`](ScenarioHost::step)
/// advances exactly one discrete step, delivering the before-tick →
/// update → after-tick notification sequence so observers on the host see
/// a consistent ordering. Hosts remember the most recently loaded
/// scenario so step failures can name it.
pub trait ScenarioHost {
    /// One-time readiness check before any scenario runs.
    fn connect(&mut self) -> Result<(), HostError>;

    /// Names of every registered scenario, in run order.
    fn scenario_names(&self) -> Vec<String>;

    /// Reset shared state and invoke the named scenario setup.
    fn load_scenario(&mut self, name: &str) -> Result<(), HostError>;

    /// Advance the simulation by one discrete step.
    fn step(&mut self) -> Result<(), HostError>;

    /// Read the current world state.
    fn capture(&self) -> Snapshot;
}
