use serde::{Deserialize, Serialize};

use crate::snapshot::{Node, NodeRef, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A rigid body in the sandbox world.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: u64,
    pub label: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f64,
    pub angular_velocity: f64,
    pub sides: u32,
    pub size: f64,
    pub density: f64,
    pub friction: f64,
    pub friction_air: f64,
    pub restitution: f64,
    pub is_static: bool,
}

impl Body {
    /// A dynamic polygon body at the given position; remaining fields take
    /// the sandbox defaults and can be overridden before insertion.
    pub fn polygon(position: Vec2, sides: u32, size: f64) -> Self {
        Self {
            id: 0,
            label: "Body".to_string(),
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            sides,
            size,
            density: 0.001,
            friction: 0.1,
            friction_air: 0.01,
            restitution: 0.0,
            is_static: false,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }
}

/// A pin constraint keeping a body at a fixed distance from a world anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: u64,
    pub body: u64,
    pub anchor: Vec2,
    pub length: f64,
    pub stiffness: f64,
}

/// The mutable contents of the sandbox: gravity plus every body and
/// constraint. Ids are assigned by the world from a shared monotonic
/// counter, so no two objects of any kind collide.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub gravity: Vec2,
    pub bodies: Vec<Body>,
    pub constraints: Vec<Constraint>,
    next_id: u64,
}

impl World {
    pub fn new() -> Self {
        Self {
            gravity: Vec2::new(0.0, 1.0),
            bodies: Vec::new(),
            constraints: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a body, assigning it a unique id. Returns the assigned id.
    pub fn add_body(&mut self, mut body: Body) -> u64 {
        let id = self.next_id();
        body.id = id;
        self.bodies.push(body);
        id
    }

    /// Pin a body to a world anchor. Returns the constraint id.
    ///
    /// # Panics
    /// Panics if `body` is not present in the world.
    pub fn add_constraint(&mut self, body: u64, anchor: Vec2, length: f64, stiffness: f64) -> u64 {
        assert!(
            self.bodies.iter().any(|b| b.id == body),
            "add_constraint: body {body} not found"
        );
        let id = self.next_id();
        self.constraints.push(Constraint {
            id,
            body,
            anchor,
            length,
            stiffness,
        });
        id
    }

    pub fn body(&self, id: u64) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: u64) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    /// Remove world contents. With `keep_static`, static bodies survive
    /// (their constraints do not).
    pub fn clear(&mut self, keep_static: bool) {
        if keep_static {
            self.bodies.retain(|b| b.is_static);
        } else {
            self.bodies.clear();
        }
        self.constraints.clear();
    }

    /// Capture the world as a cyclic snapshot graph: the world object owns
    /// the body list, and every body carries a `parent` back-reference to
    /// the world object.
    pub fn to_snapshot(&self) -> Snapshot {
        let root = Node::object();
        Node::insert(&root, "label", Node::string("World"));
        Node::insert(&root, "gravity", vec2_node(self.gravity));

        let bodies = Node::array([]);
        for body in &self.bodies {
            let node = Node::object();
            Node::insert(&node, "id", Node::int(body.id as i64));
            Node::insert(&node, "label", Node::string(&body.label));
            Node::insert(&node, "position", vec2_node(body.position));
            Node::insert(&node, "velocity", vec2_node(body.velocity));
            Node::insert(&node, "angle", Node::float(body.angle));
            Node::insert(&node, "angular_velocity", Node::float(body.angular_velocity));
            Node::insert(&node, "sides", Node::int(body.sides as i64));
            Node::insert(&node, "size", Node::float(body.size));
            Node::insert(&node, "density", Node::float(body.density));
            Node::insert(&node, "friction", Node::float(body.friction));
            Node::insert(&node, "friction_air", Node::float(body.friction_air));
            Node::insert(&node, "restitution", Node::float(body.restitution));
            Node::insert(&node, "is_static", Node::bool(body.is_static));
            Node::insert(&node, "parent", root.clone());
            Node::push(&bodies, node);
        }
        Node::insert(&root, "bodies", bodies);

        let constraints = Node::array([]);
        for constraint in &self.constraints {
            let node = Node::object();
            Node::insert(&node, "id", Node::int(constraint.id as i64));
            Node::insert(&node, "body", Node::int(constraint.body as i64));
            Node::insert(&node, "anchor", vec2_node(constraint.anchor));
            Node::insert(&node, "length", Node::float(constraint.length));
            Node::insert(&node, "stiffness", Node::float(constraint.stiffness));
            Node::push(&constraints, node);
        }
        Node::insert(&root, "constraints", constraints);

        Snapshot::new(root)
    }

    /// Rebuild a world from a captured snapshot, ignoring back-references.
    /// Returns `None` when the document does not look like a world.
    pub fn from_snapshot(snapshot: &Snapshot) -> Option<World> {
        let root = &snapshot.root;
        let gravity = read_vec2(&Node::get(root, "gravity")?)?;

        let mut world = World::new();
        world.gravity = gravity;

        let mut highest_id = 0;
        for node in Node::elements(&Node::get(root, "bodies")?) {
            let body = read_body(&node)?;
            highest_id = highest_id.max(body.id);
            world.bodies.push(body);
        }
        if let Some(constraints) = Node::get(root, "constraints") {
            for node in Node::elements(&constraints) {
                let constraint = read_constraint(&node)?;
                highest_id = highest_id.max(constraint.id);
                world.constraints.push(constraint);
            }
        }
        world.next_id = highest_id + 1;
        Some(world)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn vec2_node(v: Vec2) -> NodeRef {
    let node = Node::object();
    Node::insert(&node, "x", Node::float(v.x));
    Node::insert(&node, "y", Node::float(v.y));
    node
}

fn read_vec2(node: &NodeRef) -> Option<Vec2> {
    Some(Vec2::new(
        Node::as_f64(&Node::get(node, "x")?)?,
        Node::as_f64(&Node::get(node, "y")?)?,
    ))
}

fn read_body(node: &NodeRef) -> Option<Body> {
    Some(Body {
        id: Node::as_i64(&Node::get(node, "id")?)? as u64,
        label: Node::as_string(&Node::get(node, "label")?)?,
        position: read_vec2(&Node::get(node, "position")?)?,
        velocity: read_vec2(&Node::get(node, "velocity")?)?,
        angle: Node::as_f64(&Node::get(node, "angle")?)?,
        angular_velocity: Node::as_f64(&Node::get(node, "angular_velocity")?)?,
        sides: Node::as_i64(&Node::get(node, "sides")?)? as u32,
        size: Node::as_f64(&Node::get(node, "size")?)?,
        density: Node::as_f64(&Node::get(node, "density")?)?,
        friction: Node::as_f64(&Node::get(node, "friction")?)?,
        friction_air: Node::as_f64(&Node::get(node, "friction_air")?)?,
        restitution: Node::as_f64(&Node::get(node, "restitution")?)?,
        is_static: Node::as_bool(&Node::get(node, "is_static")?)?,
    })
}

fn read_constraint(node: &NodeRef) -> Option<Constraint> {
    Some(Constraint {
        id: Node::as_i64(&Node::get(node, "id")?)? as u64,
        body: Node::as_i64(&Node::get(node, "body")?)? as u64,
        anchor: read_vec2(&Node::get(node, "anchor")?)?,
        length: Node::as_f64(&Node::get(node, "length")?)?,
        stiffness: Node::as_f64(&Node::get(node, "stiffness")?)?,
    })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn ids_are_unique_across_bodies_and_constraints() {
        let mut world = World::new();
        let a = world.add_body(Body::polygon(Vec2::ZERO, 4, 10.0));
        let b = world.add_body(Body::polygon(Vec2::new(5.0, 0.0), 3, 10.0));
        let pin = world.add_constraint(a, Vec2::ZERO, 50.0, 0.9);
        assert_ne!(a, b);
        assert_ne!(b, pin);
    }

    #[test]
    #[should_panic(expected = "body 99 not found")]
    fn constraint_requires_existing_body() {
        let mut world = World::new();
        world.add_constraint(99, Vec2::ZERO, 10.0, 1.0);
    }

    #[test]
    fn clear_can_keep_static_bodies() {
        let mut world = World::new();
        world.add_body(Body::polygon(Vec2::ZERO, 4, 10.0).fixed().labeled("Ground"));
        let falling = world.add_body(Body::polygon(Vec2::new(0.0, -10.0), 4, 10.0));
        world.add_constraint(falling, Vec2::ZERO, 10.0, 1.0);

        world.clear(true);
        assert_eq!(world.bodies.len(), 1);
        assert!(world.bodies[0].is_static);
        assert!(world.constraints.is_empty());

        world.clear(false);
        assert!(world.bodies.is_empty());
    }

    #[test]
    fn snapshot_embeds_parent_back_reference() {
        let mut world = World::new();
        world.add_body(Body::polygon(Vec2::new(1.0, 2.0), 4, 10.0));
        let snapshot = world.to_snapshot();

        let bodies = Node::get(&snapshot.root, "bodies").unwrap();
        let body = Node::elements(&bodies).remove(0);
        let parent = Node::get(&body, "parent").unwrap();
        assert!(Rc::ptr_eq(&parent, &snapshot.root));
    }

    #[test]
    fn snapshot_round_trips_through_the_codec() {
        let mut world = World::new();
        world.gravity = Vec2::new(0.25, -0.5);
        let bob = world.add_body(Body::polygon(Vec2::new(3.0, 4.0), 5, 12.0).labeled("Bob"));
        world.add_constraint(bob, Vec2::new(3.0, 0.0), 4.0, 0.9);

        let doc = world.to_snapshot().encode();
        let decoded = Snapshot::decode(&doc).unwrap();
        let restored = World::from_snapshot(&decoded).unwrap();
        assert_eq!(restored, world);
    }

    #[test]
    fn restored_world_keeps_allocating_fresh_ids() {
        let mut world = World::new();
        world.add_body(Body::polygon(Vec2::ZERO, 4, 10.0));
        world.add_body(Body::polygon(Vec2::new(1.0, 0.0), 4, 10.0));

        let decoded = Snapshot::decode(&world.to_snapshot().encode()).unwrap();
        let mut restored = World::from_snapshot(&decoded).unwrap();
        let next = restored.add_body(Body::polygon(Vec2::ZERO, 3, 5.0));
        assert!(next > 2);
    }

    #[test]
    fn from_snapshot_rejects_foreign_documents() {
        let doc = serde_json::json!({ "unrelated": true });
        let snapshot = Snapshot::decode(&doc).unwrap();
        assert!(World::from_snapshot(&snapshot).is_none());
    }
}
