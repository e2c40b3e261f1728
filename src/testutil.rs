//! Shared helpers for integration tests.

use crate::host::{HostError, ScenarioHost, SourceLocation};
use crate::snapshot::{Node, Snapshot};

/// A host that captures deterministic synthetic snapshots, with optional
/// failure injection for the fatal paths a real engine would hit.
///
/// Captures depend only on (scenario, steps taken, salt); bumping the
/// salt stands in for "the simulation code changed since the references
/// were recorded".
pub struct ScriptedHost {
    advertised: Vec<String>,
    registered: Vec<String>,
    salt: i64,
    fail_connect: bool,
    fail_step_in: Option<String>,
    current: Option<String>,
    steps: u32,
}

impl ScriptedHost {
    pub fn new(names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        Self {
            advertised: names.clone(),
            registered: names,
            salt: 0,
            fail_connect: false,
            fail_step_in: None,
            current: None,
            steps: 0,
        }
    }

    /// Change what captures look like, as if the simulation code changed.
    pub fn with_salt(mut self, salt: i64) -> Self {
        self.salt = salt;
        self
    }

    /// Advertise a scenario name that no setup is registered for.
    pub fn advertising_unregistered(mut self, name: &str) -> Self {
        self.advertised.push(name.to_string());
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Make every step inside the named scenario fail.
    pub fn failing_step(mut self, name: &str) -> Self {
        self.fail_step_in = Some(name.to_string());
        self
    }
}

impl ScenarioHost for ScriptedHost {
    fn connect(&mut self) -> Result<(), HostError> {
        if self.fail_connect {
            return Err(HostError::Unreachable("scripted: host offline".to_string()));
        }
        Ok(())
    }

    fn scenario_names(&self) -> Vec<String> {
        self.advertised.clone()
    }

    fn load_scenario(&mut self, name: &str) -> Result<(), HostError> {
        if !self.registered.iter().any(|registered| registered == name) {
            return Err(HostError::UnknownScenario(name.to_string()));
        }
        self.current = Some(name.to_string());
        self.steps = 0;
        Ok(())
    }

    fn step(&mut self) -> Result<(), HostError> {
        let scenario = self.current.clone().unwrap_or_default();
        if self.fail_step_in.as_deref() == Some(scenario.as_str()) {
            return Err(HostError::Step {
                scenario,
                message: "scripted step failure".to_string(),
                location: Some(SourceLocation {
                    file: "scripted.rs".to_string(),
                    line: 7,
                    function: Some("step".to_string()),
                }),
            });
        }
        self.steps += 1;
        Ok(())
    }

    fn capture(&self) -> Snapshot {
        let root = Node::object();
        Node::insert(
            &root,
            "scenario",
            Node::string(self.current.as_deref().unwrap_or("")),
        );
        Node::insert(&root, "steps", Node::int(self.steps as i64));
        Node::insert(&root, "salt", Node::int(self.salt));
        Snapshot::new(root)
    }
}
