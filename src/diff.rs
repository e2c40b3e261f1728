use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One structural edit taking a base document toward a target document.
///
/// Paths are JSON pointers (`/bodies/2/position/x`) with `~0`/`~1`
/// escaping for literal `~` and `/` in keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Add { path, .. }
            | PatchOp::Remove { path }
            | PatchOp::Replace { path, .. } => path,
        }
    }
}

/// Compute the ordered structural delta from `base` to `target`.
///
/// An empty result means the documents are equivalent. The walk is
/// deterministic: object keys in sorted order, array elements by index
/// (surplus base elements removed back-to-front so earlier removals do
/// not shift later paths).
pub fn diff(base: &Value, target: &Value) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_at(&mut ops, "", base, target);
    ops
}

fn diff_at(ops: &mut Vec<PatchOp>, path: &str, base: &Value, target: &Value) {
    match (base, target) {
        (Value::Object(old), Value::Object(new)) => {
            for key in old.keys() {
                if !new.contains_key(key) {
                    ops.push(PatchOp::Remove {
                        path: child(path, key),
                    });
                }
            }
            for (key, new_value) in new {
                match old.get(key) {
                    Some(old_value) => diff_at(ops, &child(path, key), old_value, new_value),
                    None => ops.push(PatchOp::Add {
                        path: child(path, key),
                        value: new_value.clone(),
                    }),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            let common = old.len().min(new.len());
            for index in 0..common {
                diff_at(ops, &index_child(path, index), &old[index], &new[index]);
            }
            for index in (common..old.len()).rev() {
                ops.push(PatchOp::Remove {
                    path: index_child(path, index),
                });
            }
            for (index, value) in new.iter().enumerate().skip(common) {
                ops.push(PatchOp::Add {
                    path: index_child(path, index),
                    value: value.clone(),
                });
            }
        }
        _ => {
            if base != target {
                ops.push(PatchOp::Replace {
                    path: path.to_string(),
                    value: target.clone(),
                });
            }
        }
    }
}

fn child(path: &str, key: &str) -> String {
    format!("{path}/{}", escape(key))
}

fn index_child(path: &str, index: usize) -> String {
    format!("{path}/{index}")
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
