//! Built-in stages.

mod file;
mod identity;
mod markup;
mod script;
mod style;

use super::StageRegistry;
use serde_json::Value;
use std::sync::Arc;

pub(super) fn register_all(registry: &mut StageRegistry) {
    registry.register(Arc::new(identity::Identity));
    registry.register(Arc::new(script::TypeScript));
    registry.register(Arc::new(script::JavaScript));
    registry.register(Arc::new(script::Json));
    registry.register(Arc::new(script::MinifyJs));
    registry.register(Arc::new(style::Css));
    registry.register(Arc::new(style::StyleInject));
    registry.register(Arc::new(style::MinifyCss));
    registry.register(Arc::new(markup::Html));
    registry.register(Arc::new(file::File));

    registry.alias("raw", "identity");
    registry.alias("ts", "typescript");
    registry.alias("js", "javascript");
}

/// Read an optional boolean option, rejecting other shapes.
fn bool_option(options: &Value, key: &str) -> Result<Option<bool>, String> {
    match options {
        Value::Null => Ok(None),
        Value::Object(map) => {
            if let Some(unknown) = map.keys().find(|k| k.as_str() != key) {
                return Err(format!("unknown option `{unknown}`"));
            }
            match map.get(key) {
                None => Ok(None),
                Some(Value::Bool(b)) => Ok(Some(*b)),
                Some(_) => Err(format!("option `{key}` must be a boolean")),
            }
        }
        _ => Err("options must be a table".into()),
    }
}

/// JavaScript string literal for arbitrary text.
fn js_string(text: &str) -> String {
    // JSON strings are valid JS; escape the two line separators JSON allows raw
    serde_json::Value::String(text.to_owned())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
