//! Identity-table codec between cyclic snapshot graphs and plain JSON.
//!
//! Containers reachable through more than one path are tagged with a
//! `"$id"` on first emission; every later occurrence becomes a
//! `{"$ref": id}` marker. Shared arrays, which cannot carry an inline key,
//! are wrapped as `{"$id": id, "$values": [...]}`. Ids are assigned in
//! depth-first document order, so encoding the same graph twice yields
//! byte-identical output.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value, json};
use thiserror::Error;

use super::value::{Node, NodeRef, Snapshot};

/// Errors raised while decoding a persisted snapshot document.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("reference to unknown snapshot id {0}")]
    UnresolvedRef(u64),
    #[error("duplicate snapshot id {0}")]
    DuplicateId(u64),
    #[error("malformed {0} marker")]
    Malformed(&'static str),
    #[error("snapshot document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flatten a snapshot graph into an acyclic JSON document.
pub fn encode(snapshot: &Snapshot) -> Value {
    let mut visits = HashMap::new();
    count_visits(&snapshot.root, &mut visits);

    let mut emitter = Emitter {
        visits,
        ids: HashMap::new(),
        next_id: 1,
    };
    emitter.emit(&snapshot.root)
}

/// Rebuild a snapshot graph from an encoded document, resolving `$ref`
/// markers back to the containers they alias.
pub fn decode(doc: &Value) -> Result<Snapshot, CodecError> {
    let mut table = HashMap::new();
    let root = decode_value(doc, &mut table)?;
    Ok(Snapshot::new(root))
}

impl Snapshot {
    pub fn encode(&self) -> Value {
        encode(self)
    }

    pub fn decode(doc: &Value) -> Result<Self, CodecError> {
        decode(doc)
    }

    /// Encode and pretty-print, the form written to reference files and
    /// durable storage.
    pub fn to_json_string(&self) -> String {
        let doc = self.encode();
        serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "null".to_string())
    }

    pub fn from_json_str(text: &str) -> Result<Self, CodecError> {
        let doc: Value = serde_json::from_str(text)?;
        decode(&doc)
    }
}

fn node_key(node: &NodeRef) -> usize {
    Rc::as_ptr(node) as usize
}

/// First pass: count how many paths reach each container. A container on
/// a cycle is always revisited, so it ends up with a count above one.
fn count_visits(node: &NodeRef, visits: &mut HashMap<usize, u32>) {
    let is_container = matches!(&*node.borrow(), Node::Array(_) | Node::Object(_));
    if !is_container {
        return;
    }
    let key = node_key(node);
    if let Some(count) = visits.get_mut(&key) {
        *count += 1;
        return;
    }
    visits.insert(key, 1);
    match &*node.borrow() {
        Node::Array(items) => {
            for item in items {
                count_visits(item, visits);
            }
        }
        Node::Object(map) => {
            for value in map.values() {
                count_visits(value, visits);
            }
        }
        _ => unreachable!(),
    }
}

struct Emitter {
    visits: HashMap<usize, u32>,
    ids: HashMap<usize, u64>,
    next_id: u64,
}

impl Emitter {
    fn emit(&mut self, node: &NodeRef) -> Value {
        let key = node_key(node);
        let shared = self.visits.get(&key).is_some_and(|count| *count > 1);
        if shared {
            if let Some(id) = self.ids.get(&key) {
                return json!({ "$ref": id });
            }
            let id = self.next_id;
            self.next_id += 1;
            self.ids.insert(key, id);
            return match &*node.borrow() {
                Node::Array(items) => {
                    let values: Vec<Value> = items.iter().map(|item| self.emit(item)).collect();
                    json!({ "$id": id, "$values": values })
                }
                Node::Object(map) => {
                    let mut out = Map::new();
                    out.insert("$id".to_string(), json!(id));
                    for (name, value) in map {
                        out.insert(name.clone(), self.emit(value));
                    }
                    Value::Object(out)
                }
                _ => unreachable!("only containers are shared"),
            };
        }

        match &*node.borrow() {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(items) => {
                Value::Array(items.iter().map(|item| self.emit(item)).collect())
            }
            Node::Object(map) => {
                let mut out = Map::new();
                for (name, value) in map {
                    out.insert(name.clone(), self.emit(value));
                }
                Value::Object(out)
            }
        }
    }
}

fn decode_value(
    value: &Value,
    table: &mut HashMap<u64, NodeRef>,
) -> Result<NodeRef, CodecError> {
    match value {
        Value::Null => Ok(Node::null()),
        Value::Bool(b) => Ok(Node::bool(*b)),
        Value::Number(n) => Ok(Node::Number(n.clone()).into_ref()),
        Value::String(s) => Ok(Node::string(s)),
        Value::Array(items) => {
            let node = Node::array([]);
            for item in items {
                Node::push(&node, decode_value(item, table)?);
            }
            Ok(node)
        }
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(id_value) = map.get("$ref") {
                    let id = id_value.as_u64().ok_or(CodecError::Malformed("$ref"))?;
                    return table
                        .get(&id)
                        .cloned()
                        .ok_or(CodecError::UnresolvedRef(id));
                }
            }
            if let Some(id_value) = map.get("$id") {
                let id = id_value.as_u64().ok_or(CodecError::Malformed("$id"))?;
                // Register the container before filling it so markers
                // inside its own subtree resolve to it.
                if let Some(values) = map.get("$values") {
                    let items = values.as_array().ok_or(CodecError::Malformed("$values"))?;
                    let node = Node::array([]);
                    if table.insert(id, node.clone()).is_some() {
                        return Err(CodecError::DuplicateId(id));
                    }
                    for item in items {
                        Node::push(&node, decode_value(item, table)?);
                    }
                    return Ok(node);
                }
                let node = Node::object();
                if table.insert(id, node.clone()).is_some() {
                    return Err(CodecError::DuplicateId(id));
                }
                for (name, entry) in map {
                    if name == "$id" {
                        continue;
                    }
                    Node::insert(&node, name, decode_value(entry, table)?);
                }
                return Ok(node);
            }
            let node = Node::object();
            for (name, entry) in map {
                Node::insert(&node, name, decode_value(entry, table)?);
            }
            Ok(node)
        }
    }
}
