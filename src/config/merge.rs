//! Deep merge of configuration trees.
//!
//! Rules, applied key by key:
//!
//! | base        | overlay     | result                          |
//! |-------------|-------------|---------------------------------|
//! | absent      | any         | overlay                         |
//! | any         | absent      | base                            |
//! | sequence    | sequence    | base items, then overlay items  |
//! | mapping     | mapping     | recursive merge                 |
//! | sequence    | mapping     | error                           |
//! | mapping     | sequence    | error                           |
//! | otherwise   |             | overlay                         |

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("`{path}` is a {base} in the base config but a {overlay} in the overlay")]
    Conflict {
        path: String,
        base: &'static str,
        overlay: &'static str,
    },
}

/// Merge `overlay` on top of `base`, returning a new tree.
pub fn merge(base: &Value, overlay: &Value) -> Result<Value, MergeError> {
    merge_at(base, overlay, &mut Vec::new())
}

/// Fold `merge` over documents left to right.
pub fn merge_all<'a>(docs: impl IntoIterator<Item = &'a Value>) -> Result<Value, MergeError> {
    docs.into_iter()
        .try_fold(Value::Object(Map::new()), |acc, doc| merge(&acc, doc))
}

fn merge_at(base: &Value, overlay: &Value, path: &mut Vec<String>) -> Result<Value, MergeError> {
    match (base, overlay) {
        (Value::Array(b), Value::Array(o)) => {
            let mut items = Vec::with_capacity(b.len() + o.len());
            items.extend(b.iter().cloned());
            items.extend(o.iter().cloned());
            Ok(Value::Array(items))
        }
        (Value::Object(b), Value::Object(o)) => {
            let mut merged = b.clone();
            for (key, value) in o {
                let next = match b.get(key) {
                    Some(existing) => {
                        path.push(key.clone());
                        let next = merge_at(existing, value, path);
                        path.pop();
                        next?
                    }
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Ok(Value::Object(merged))
        }
        (Value::Array(_), Value::Object(_)) | (Value::Object(_), Value::Array(_)) => {
            Err(MergeError::Conflict {
                path: dotted(path),
                base: kind_name(base),
                overlay: kind_name(overlay),
            })
        }
        _ => Ok(overlay.clone()),
    }
}

fn dotted(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
        _ => "scalar",
    }
}
