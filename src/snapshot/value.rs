use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Number;

/// Shared handle to a snapshot node.
///
/// Cloning the handle aliases the node; that aliasing is how shared
/// substructure and back-references are expressed in a capture.
pub type NodeRef = Rc<RefCell<Node>>;

/// One node in a captured world-state document.
///
/// Unlike `serde_json::Value`, containers hold [`NodeRef`]s, so a node may
/// be reachable through more than one path — including through one of its
/// own descendants. The codec in [`super::codec`] flattens that sharing
/// into id markers when writing to disk.
#[derive(Debug)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<NodeRef>),
    Object(BTreeMap<String, NodeRef>),
}

impl Node {
    pub fn into_ref(self) -> NodeRef {
        Rc::new(RefCell::new(self))
    }

    pub fn null() -> NodeRef {
        Node::Null.into_ref()
    }

    pub fn bool(value: bool) -> NodeRef {
        Node::Bool(value).into_ref()
    }

    pub fn int(value: i64) -> NodeRef {
        Node::Number(Number::from(value)).into_ref()
    }

    /// Non-finite values have no JSON form and collapse to null.
    pub fn float(value: f64) -> NodeRef {
        match Number::from_f64(value) {
            Some(n) => Node::Number(n).into_ref(),
            None => Node::null(),
        }
    }

    pub fn string(value: &str) -> NodeRef {
        Node::String(value.to_string()).into_ref()
    }

    pub fn array(items: impl IntoIterator<Item = NodeRef>) -> NodeRef {
        Node::Array(items.into_iter().collect()).into_ref()
    }

    pub fn object() -> NodeRef {
        Node::Object(BTreeMap::new()).into_ref()
    }

    /// Insert a key into an object node.
    ///
    /// # Panics
    /// Panics if `object` is not an object node.
    pub fn insert(object: &NodeRef, key: &str, value: NodeRef) {
        match &mut *object.borrow_mut() {
            Node::Object(map) => {
                map.insert(key.to_string(), value);
            }
            other => panic!("insert: expected object node, got {other:?}"),
        }
    }

    /// Append an element to an array node.
    ///
    /// # Panics
    /// Panics if `array` is not an array node.
    pub fn push(array: &NodeRef, value: NodeRef) {
        match &mut *array.borrow_mut() {
            Node::Array(items) => items.push(value),
            other => panic!("push: expected array node, got {other:?}"),
        }
    }

    /// Look up a key on an object node. `None` for missing keys and for
    /// non-object nodes.
    pub fn get(node: &NodeRef, key: &str) -> Option<NodeRef> {
        match &*node.borrow() {
            Node::Object(map) => map.get(key).cloned(),
            _ => None,
        }
    }

    pub fn as_f64(node: &NodeRef) -> Option<f64> {
        match &*node.borrow() {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(node: &NodeRef) -> Option<i64> {
        match &*node.borrow() {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(node: &NodeRef) -> Option<bool> {
        match &*node.borrow() {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string(node: &NodeRef) -> Option<String> {
        match &*node.borrow() {
            Node::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Clone out the elements of an array node.
    pub fn elements(node: &NodeRef) -> Vec<NodeRef> {
        match &*node.borrow() {
            Node::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }
}

/// A captured world state: the root of a possibly-cyclic node graph.
///
/// Cloning a snapshot is shallow — both clones alias the same graph.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub root: NodeRef,
}

impl Snapshot {
    pub fn new(root: NodeRef) -> Self {
        Self { root }
    }
}
