use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::world::{Body, Vec2};
use super::Engine;
use crate::host::{HostError, ScenarioHost};
use crate::snapshot::Snapshot;

/// A demo setup: builds a scene into a freshly reset engine.
pub type DemoFn = fn(&mut Engine);

/// The built-in host: a sandbox engine plus named demo scenes.
///
/// Scene setups must be deterministic — any randomness comes from a rng
/// seeded per invocation, so loading the same scene twice always yields
/// the same world.
pub struct DemoHost {
    engine: Engine,
    demos: BTreeMap<&'static str, DemoFn>,
}

impl DemoHost {
    /// An empty host; register scenes with [`register`](DemoHost::register).
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
            demos: BTreeMap::new(),
        }
    }

    /// Host with the standard demo scenes registered.
    pub fn standard() -> Self {
        let mut host = Self::new();
        host.register("pendulum", pendulum);
        host.register("shower", shower);
        host.register("stack", stack);
        host
    }

    pub fn register(&mut self, name: &'static str, demo: DemoFn) {
        self.demos.insert(name, demo);
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

impl Default for DemoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioHost for DemoHost {
    fn connect(&mut self) -> Result<(), HostError> {
        Ok(())
    }

    fn scenario_names(&self) -> Vec<String> {
        self.demos.keys().map(|name| name.to_string()).collect()
    }

    fn load_scenario(&mut self, name: &str) -> Result<(), HostError> {
        let demo = *self
            .demos
            .get(name)
            .ok_or_else(|| HostError::UnknownScenario(name.to_string()))?;
        self.engine.reset();
        demo(&mut self.engine);
        Ok(())
    }

    fn step(&mut self) -> Result<(), HostError> {
        self.engine.step();
        Ok(())
    }

    fn capture(&self) -> Snapshot {
        self.engine.capture()
    }
}

/// A static ground slab under a 3×3 grid of boxes.
fn stack(engine: &mut Engine) {
    engine
        .world
        .add_body(Body::polygon(Vec2::new(400.0, 600.0), 4, 800.0).fixed().labeled("Ground"));
    for row in 0..3 {
        for col in 0..3 {
            let position = Vec2::new(300.0 + col as f64 * 45.0, 400.0 + row as f64 * 45.0);
            engine.world.add_body(Body::polygon(position, 4, 40.0).labeled("Box"));
        }
    }
}

/// A single bob pinned below a fixed anchor.
fn pendulum(engine: &mut Engine) {
    let bob = engine
        .world
        .add_body(Body::polygon(Vec2::new(500.0, 200.0), 8, 20.0).labeled("Bob"));
    engine
        .world
        .add_constraint(bob, Vec2::new(400.0, 100.0), 140.0, 0.9);
}

/// A burst of falling polygons with seeded random placement.
fn shower(engine: &mut Engine) {
    let mut rng = SmallRng::seed_from_u64(9);
    engine
        .world
        .add_body(Body::polygon(Vec2::new(400.0, 600.0), 4, 800.0).fixed().labeled("Ground"));
    for _ in 0..12 {
        let position = Vec2::new(
            rng.random_range(100.0..700.0),
            rng.random_range(-200.0..0.0),
        );
        let sides = rng.random_range(3..=8);
        let size = rng.random_range(10.0..40.0);
        engine.world.add_body(Body::polygon(position, sides, size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_scenes_are_listed_in_stable_order() {
        let host = DemoHost::standard();
        assert_eq!(host.scenario_names(), vec!["pendulum", "shower", "stack"]);
    }

    #[test]
    fn loading_unknown_scene_fails_by_name() {
        let mut host = DemoHost::standard();
        match host.load_scenario("avalanche") {
            Err(HostError::UnknownScenario(name)) => assert_eq!(name, "avalanche"),
            other => panic!("expected UnknownScenario, got {other:?}"),
        }
    }

    #[test]
    fn loading_resets_previous_scene_state() {
        let mut host = DemoHost::standard();
        host.load_scenario("stack").unwrap();
        for _ in 0..5 {
            host.step().unwrap();
        }
        let first = host.capture().encode();

        host.load_scenario("shower").unwrap();
        host.load_scenario("stack").unwrap();
        for _ in 0..5 {
            host.step().unwrap();
        }
        assert_eq!(host.capture().encode(), first);
    }

    #[test]
    fn seeded_scene_is_identical_across_loads() {
        let mut host = DemoHost::standard();
        host.load_scenario("shower").unwrap();
        let first = host.capture().encode();
        host.load_scenario("shower").unwrap();
        assert_eq!(host.capture().encode(), first);
    }

    #[test]
    fn pendulum_scene_has_a_constraint() {
        let mut host = DemoHost::standard();
        host.load_scenario("pendulum").unwrap();
        assert_eq!(host.engine().world.constraints.len(), 1);
    }
}

