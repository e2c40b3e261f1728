//! Live control panel over a running sandbox engine.
//!
//! The panel is a binding registry, not a widget tree: a GUI renders the
//! bindings it exposes and calls [`Panel::set`] on edits and
//! [`Panel::refresh`] periodically, because the simulation mutates some
//! bound fields (frame counters, step totals) on its own.

pub mod binding;
pub mod presentation;
pub mod storage;

pub use binding::{Binding, ControlKind, ControlValue};
pub use presentation::{OffscreenSurface, PointerTracker, Presentation, PresentationFactory};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::world::{Body, Vec2};
use crate::engine::{Engine, Metrics};
use crate::events::{EventHub, Notification};
use crate::snapshot::Snapshot;

/// Key under which the serialized world is persisted.
pub const WORLD_KEY: &str = "world";

/// Engine handle shared between the panel and whatever drives stepping.
pub type SharedEngine = Rc<RefCell<Engine>>;

/// Parameters for the spawn-bodies action; panel-owned and bindable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSettings {
    pub amount: u32,
    pub size: f64,
    pub sides: u32,
    pub density: f64,
    pub friction: f64,
    pub friction_air: f64,
    pub restitution: f64,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            amount: 1,
            size: 40.0,
            sides: 4,
            density: 0.001,
            friction: 0.1,
            friction_air: 0.01,
            restitution: 0.0,
        }
    }
}

/// The control panel: bindings, trigger actions, world persistence, and
/// presentation-backend management for one engine.
pub struct Panel {
    engine: SharedEngine,
    bindings: Vec<Binding>,
    spawn: Rc<RefCell<SpawnSettings>>,
    storage: Option<Box<dyn KeyValueStore>>,
    presentation: Option<Box<dyn Presentation>>,
    factory: Option<PresentationFactory>,
    pending_backend: Rc<RefCell<Option<String>>>,
    pointer: PointerTracker,
    actions: Vec<(String, Box<dyn FnMut()>)>,
    events: EventHub,
}

impl Panel {
    /// Panel with the standard binding set over the given engine.
    pub fn new(engine: SharedEngine) -> Self {
        let mut panel = Self {
            engine,
            bindings: Vec::new(),
            spawn: Rc::new(RefCell::new(SpawnSettings::default())),
            storage: None,
            presentation: None,
            factory: None,
            pending_backend: Rc::new(RefCell::new(None)),
            pointer: PointerTracker::default(),
            actions: Vec::new(),
            events: EventHub::new(),
        };
        panel.install_standard_bindings();
        panel
    }

    /// Attach durable storage for the save/load actions.
    pub fn attach_storage(&mut self, store: Box<dyn KeyValueStore>) {
        self.storage = Some(store);
    }

    /// Attach a presentation factory plus the selectable backend kinds,
    /// and build the initial surface.
    pub fn attach_presentation(
        &mut self,
        kinds: &[&str],
        initial: &str,
        factory: PresentationFactory,
    ) {
        let options: Vec<String> = kinds.iter().map(|kind| kind.to_string()).collect();
        let pending = self.pending_backend.clone();
        let initial_owned = initial.to_string();
        let current = Rc::new(RefCell::new(initial_owned.clone()));
        let read_current = current.clone();
        self.bindings.push(Binding::new(
            "render",
            "render.backend",
            ControlKind::Select { options },
            Box::new(move || ControlValue::Choice(read_current.borrow().clone())),
            Some(Box::new(move |value| {
                if let ControlValue::Choice(kind) = value {
                    *current.borrow_mut() = kind.clone();
                    *pending.borrow_mut() = Some(kind);
                }
            })),
        ));
        self.factory = Some(factory);
        self.swap_backend(&initial_owned);
    }

    // -- Binding registration --

    pub fn bind_slider(
        &mut self,
        group: &str,
        field: &str,
        range: (f64, f64),
        step: f64,
        read: impl Fn() -> f64 + 'static,
        mut write: impl FnMut(f64) + 'static,
    ) {
        self.bindings.push(Binding::new(
            group,
            field,
            ControlKind::Slider {
                min: range.0,
                max: range.1,
                step,
            },
            Box::new(move || ControlValue::Number(read())),
            Some(Box::new(move |value| {
                if let ControlValue::Number(n) = value {
                    write(n);
                }
            })),
        ));
    }

    pub fn bind_toggle(
        &mut self,
        group: &str,
        field: &str,
        read: impl Fn() -> bool + 'static,
        mut write: impl FnMut(bool) + 'static,
    ) {
        self.bindings.push(Binding::new(
            group,
            field,
            ControlKind::Toggle,
            Box::new(move || ControlValue::Toggle(read())),
            Some(Box::new(move |value| {
                if let ControlValue::Toggle(b) = value {
                    write(b);
                }
            })),
        ));
    }

    pub fn bind_readout(
        &mut self,
        group: &str,
        field: &str,
        read: impl Fn() -> f64 + 'static,
    ) {
        self.bindings.push(Binding::new(
            group,
            field,
            ControlKind::Readout,
            Box::new(move || ControlValue::Number(read())),
            None,
        ));
    }

    // -- Widget surface --

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, field: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.field == field)
    }

    /// Write a widget edit through to its bound field. Returns whether an
    /// edit was accepted.
    pub fn set(&mut self, field: &str, value: ControlValue) -> bool {
        let Some(binding) = self.bindings.iter_mut().find(|b| b.field == field) else {
            return false;
        };
        let accepted = binding.set(value);
        let pending = self.pending_backend.borrow_mut().take();
        if let Some(kind) = pending {
            self.swap_backend(&kind);
        }
        accepted
    }

    /// Pull every bound field's current value into its displayed value.
    pub fn refresh(&mut self) {
        for binding in &mut self.bindings {
            binding.refresh();
        }
    }

    /// Subscribe to a panel notification (`clear`, `save`, `load`).
    pub fn on(&mut self, name: &str, listener: impl FnMut(&Notification) + 'static) {
        self.events.on(name, listener);
    }

    // -- Trigger actions --

    /// Register a custom named action next to the built-in ones.
    pub fn register_action(&mut self, name: &str, action: impl FnMut() + 'static) {
        self.actions.push((name.to_string(), Box::new(action)));
    }

    /// Run a named action. Built-ins: `add_bodies`, `clear`, `save`,
    /// `load`. Returns whether the name was known.
    pub fn trigger(&mut self, name: &str) -> bool {
        match name {
            "add_bodies" => self.spawn_bodies(),
            "clear" => self.clear(),
            "save" => self.save(),
            "load" => self.load(),
            _ => {
                let Some((_, action)) = self
                    .actions
                    .iter_mut()
                    .find(|(registered, _)| registered == name)
                else {
                    return false;
                };
                action();
            }
        }
        true
    }

    pub fn action_names(&self) -> Vec<&str> {
        let mut names = vec!["add_bodies", "clear", "save", "load"];
        names.extend(self.actions.iter().map(|(name, _)| name.as_str()));
        names
    }

    /// Spawn bodies from the current spawn settings, spaced out along a
    /// row like the classic sandbox toolbar does.
    pub fn spawn_bodies(&mut self) {
        let spawn = self.spawn.borrow().clone();
        let mut engine = self.engine.borrow_mut();
        for i in 0..spawn.amount {
            let offset = i as f64 * (spawn.size + 50.0);
            let mut body = Body::polygon(
                Vec2::new(120.0 + offset, 200.0),
                spawn.sides,
                spawn.size,
            );
            body.density = spawn.density;
            body.friction = spawn.friction;
            body.friction_air = spawn.friction_air;
            body.restitution = spawn.restitution;
            engine.world.add_body(body);
        }
    }

    /// Empty the world (static bodies survive), reset accumulated stepping
    /// state, and have the presentation drop its cached drawables.
    pub fn clear(&mut self) {
        {
            let mut engine = self.engine.borrow_mut();
            engine.world.clear(true);
            engine.timing.timestamp = 0.0;
            engine.metrics = Metrics::default();
        }
        if let Some(presentation) = &mut self.presentation {
            presentation.clear();
        }
        self.events.emit("panel", "clear");
    }

    /// Serialize the whole world graph and persist it under
    /// [`WORLD_KEY`]. Without usable storage the write is skipped; the
    /// notification still fires because the user action happened.
    pub fn save(&mut self) {
        if let Some(store) = &mut self.storage {
            let text = self.engine.borrow().capture().to_json_string();
            if !store.put(WORLD_KEY, &text) {
                tracing::warn!("world save skipped: storage unavailable");
            }
        }
        self.events.emit("panel", "save");
    }

    /// Restore the stored world, replacing the engine's current one.
    /// Missing storage or a missing key is a no-op; malformed stored data
    /// is logged and skipped.
    pub fn load(&mut self) {
        if let Some(store) = &self.storage {
            if let Some(text) = store.get(WORLD_KEY) {
                let restored = Snapshot::from_json_str(&text)
                    .ok()
                    .and_then(|snapshot| crate::engine::World::from_snapshot(&snapshot));
                match restored {
                    Some(world) => self.engine.borrow_mut().replace_world(world),
                    None => tracing::warn!("stored world is malformed; load skipped"),
                }
            }
        }
        self.events.emit("panel", "load");
    }

    // -- Presentation --

    pub fn presentation_kind(&self) -> Option<&str> {
        self.presentation.as_deref().map(Presentation::kind)
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    /// Drop the current surface, build a new one of the requested kind
    /// from the engine's render options, and re-route pointer input.
    fn swap_backend(&mut self, kind: &str) {
        let Some(factory) = &self.factory else {
            return;
        };
        let mut surface = factory(kind, &self.engine.borrow().render);
        surface.attach_pointer(&mut self.pointer);
        self.presentation = Some(surface);
    }

    fn install_standard_bindings(&mut self) {
        let engine = self.engine.clone();
        self.bind_readout("metrics", "timing.fps", move || engine.borrow().timing.fps);
        let engine = self.engine.clone();
        self.bind_readout("metrics", "metrics.steps", move || {
            engine.borrow().metrics.steps as f64
        });
        let engine = self.engine.clone();
        self.bind_readout("metrics", "metrics.bodies", move || {
            engine.borrow().metrics.bodies as f64
        });

        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_slider(
            "world",
            "gravity.x",
            (-1.0, 1.0),
            0.01,
            move || engine.borrow().world.gravity.x,
            move |v| write.borrow_mut().world.gravity.x = v,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_slider(
            "world",
            "gravity.y",
            (-1.0, 1.0),
            0.01,
            move || engine.borrow().world.gravity.y,
            move |v| write.borrow_mut().world.gravity.y = v,
        );

        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_slider(
            "engine",
            "timing.time_scale",
            (0.0, 1.2),
            0.05,
            move || engine.borrow().timing.time_scale,
            move |v| write.borrow_mut().timing.time_scale = v,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_slider(
            "engine",
            "velocity_iterations",
            (1.0, 10.0),
            1.0,
            move || engine.borrow().velocity_iterations as f64,
            move |v| write.borrow_mut().velocity_iterations = v.round() as u32,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_slider(
            "engine",
            "position_iterations",
            (1.0, 10.0),
            1.0,
            move || engine.borrow().position_iterations as f64,
            move |v| write.borrow_mut().position_iterations = v.round() as u32,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_toggle(
            "engine",
            "enabled",
            move || engine.borrow().enabled,
            move |v| write.borrow_mut().enabled = v,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_toggle(
            "engine",
            "enable_sleeping",
            move || engine.borrow().enable_sleeping,
            move |v| write.borrow_mut().enable_sleeping = v,
        );

        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_toggle(
            "render",
            "render.wireframes",
            move || engine.borrow().render.wireframes,
            move |v| write.borrow_mut().render.wireframes = v,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_toggle(
            "render",
            "render.show_debug",
            move || engine.borrow().render.show_debug,
            move |v| write.borrow_mut().render.show_debug = v,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_toggle(
            "render",
            "render.show_velocity",
            move || engine.borrow().render.show_velocity,
            move |v| write.borrow_mut().render.show_velocity = v,
        );
        let engine = self.engine.clone();
        let write = self.engine.clone();
        self.bind_toggle(
            "render",
            "render.enabled",
            move || engine.borrow().render.enabled,
            move |v| write.borrow_mut().render.enabled = v,
        );

        let spawn = self.spawn.clone();
        let write = self.spawn.clone();
        self.bind_slider(
            "controls",
            "spawn.amount",
            (1.0, 5.0),
            1.0,
            move || spawn.borrow().amount as f64,
            move |v| write.borrow_mut().amount = v.round() as u32,
        );
        let spawn = self.spawn.clone();
        let write = self.spawn.clone();
        self.bind_slider(
            "controls",
            "spawn.size",
            (5.0, 150.0),
            1.0,
            move || spawn.borrow().size,
            move |v| write.borrow_mut().size = v,
        );
        let spawn = self.spawn.clone();
        let write = self.spawn.clone();
        self.bind_slider(
            "controls",
            "spawn.sides",
            (1.0, 8.0),
            1.0,
            move || spawn.borrow().sides as f64,
            move |v| write.borrow_mut().sides = v.round() as u32,
        );
        let spawn = self.spawn.clone();
        let write = self.spawn.clone();
        self.bind_slider(
            "controls",
            "spawn.density",
            (0.0001, 0.01),
            0.001,
            move || spawn.borrow().density,
            move |v| write.borrow_mut().density = v,
        );
        let spawn = self.spawn.clone();
        let write = self.spawn.clone();
        self.bind_slider(
            "controls",
            "spawn.friction",
            (0.0, 1.0),
            0.05,
            move || spawn.borrow().friction,
            move |v| write.borrow_mut().friction = v,
        );
        let spawn = self.spawn.clone();
        let write = self.spawn.clone();
        self.bind_slider(
            "controls",
            "spawn.restitution",
            (0.0, 1.0),
            0.1,
            move || spawn.borrow().restitution,
            move |v| write.borrow_mut().restitution = v,
        );
    }
}
