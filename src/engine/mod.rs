pub mod demos;
pub mod world;

pub use demos::DemoHost;
pub use world::{Body, Constraint, Vec2, World};

use serde::{Deserialize, Serialize};

use crate::events::EventHub;
use crate::snapshot::Snapshot;

/// Wall-clock-free timing state, advanced only by discrete steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Accumulated simulated milliseconds.
    pub timestamp: f64,
    /// Milliseconds advanced per step.
    pub delta: f64,
    pub time_scale: f64,
    /// Nominal frame rate implied by `delta`; surfaced as a panel readout.
    pub fps: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            delta: 1000.0 / 60.0,
            time_scale: 1.0,
            fps: 60.0,
        }
    }
}

/// Presentation options shared by every backend: what to draw, not how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub wireframes: bool,
    pub show_debug: bool,
    pub show_positions: bool,
    pub show_bounds: bool,
    pub show_velocity: bool,
    pub show_collisions: bool,
    pub show_axes: bool,
    pub show_angle_indicator: bool,
    pub show_sleeping: bool,
    pub show_ids: bool,
    pub show_shadows: bool,
    pub enabled: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wireframes: true,
            show_debug: false,
            show_positions: false,
            show_bounds: false,
            show_velocity: false,
            show_collisions: false,
            show_axes: false,
            show_angle_indicator: false,
            show_sleeping: true,
            show_ids: false,
            show_shadows: false,
            enabled: true,
        }
    }
}

/// Step counters surfaced in the panel's metrics group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub steps: u64,
    pub bodies: usize,
}

/// The sandbox simulation: a [`World`] plus stepping state and options.
///
/// Integration is deliberately plain — fixed-step semi-implicit Euler with
/// air drag and positional pin-constraint solving, no collision handling.
/// What matters here is that stepping is deterministic: the same scene
/// stepped the same number of times always captures identically.
#[derive(Debug)]
pub struct Engine {
    pub world: World,
    pub timing: Timing,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub enabled: bool,
    pub enable_sleeping: bool,
    pub render: RenderOptions,
    pub metrics: Metrics,
    pub events: EventHub,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            timing: Timing::default(),
            velocity_iterations: 4,
            position_iterations: 6,
            enabled: true,
            enable_sleeping: false,
            render: RenderOptions::default(),
            metrics: Metrics::default(),
            events: EventHub::new(),
        }
    }

    /// Advance one discrete step, emitting `before_tick`, updating the
    /// world, then emitting `after_tick`. Observers therefore always see
    /// the same ordering regardless of who drives the engine.
    pub fn step(&mut self) {
        self.events.emit("engine", "before_tick");
        if self.enabled {
            self.integrate();
        }
        self.events.emit("engine", "after_tick");
    }

    fn integrate(&mut self) {
        let dt = self.timing.delta * self.timing.time_scale / 1000.0;
        let gravity = self.world.gravity;

        for body in &mut self.world.bodies {
            if body.is_static {
                continue;
            }
            body.velocity.x += gravity.x * dt;
            body.velocity.y += gravity.y * dt;
            let drag = 1.0 - body.friction_air;
            body.velocity.x *= drag;
            body.velocity.y *= drag;
            body.position.x += body.velocity.x * dt;
            body.position.y += body.velocity.y * dt;
            body.angle += body.angular_velocity * dt;
        }

        for _ in 0..self.position_iterations {
            self.solve_constraints();
        }

        self.timing.timestamp += self.timing.delta * self.timing.time_scale;
        self.timing.fps = 1000.0 / self.timing.delta;
        self.metrics.steps += 1;
        self.metrics.bodies = self.world.bodies.len();
    }

    /// Project each pinned body back toward its anchor distance.
    fn solve_constraints(&mut self) {
        let constraints = self.world.constraints.clone();
        for constraint in &constraints {
            let Some(body) = self.world.body_mut(constraint.body) else {
                continue;
            };
            if body.is_static {
                continue;
            }
            let dx = body.position.x - constraint.anchor.x;
            let dy = body.position.y - constraint.anchor.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance == 0.0 {
                continue;
            }
            let error = (distance - constraint.length) / distance;
            body.position.x -= dx * error * constraint.stiffness;
            body.position.y -= dy * error * constraint.stiffness;
        }
    }

    /// Reset world contents and accumulated stepping state, keeping
    /// options and registered listeners.
    pub fn reset(&mut self) {
        self.world = World::new();
        self.timing.timestamp = 0.0;
        self.metrics = Metrics::default();
    }

    /// Swap in a different world, e.g. one restored from storage.
    pub fn replace_world(&mut self, world: World) {
        self.world = world;
    }

    pub fn capture(&self) -> Snapshot {
        self.world.to_snapshot()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
