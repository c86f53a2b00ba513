//! `define`: compile-time constants substituted into script modules.

use super::{LifecyclePoint, Plugin};
use crate::config::DefineOptions;
use crate::core::BuildMode;
use crate::pipeline::BuildContext;
use anyhow::{Result, bail};
use serde_json::{Map, Value};

pub struct Define(pub DefineOptions);

impl Plugin for Define {
    fn name(&self) -> &'static str {
        "define"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::ResolveConfig]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let mut entries = Vec::new();
        flatten("", &self.0.definitions, &mut entries);
        entries.extend(env_definitions(&self.0.env, ctx.config.mode, |name| {
            std::env::var(name).ok()
        })?);

        for (name, value) in &entries {
            crate::debug!("define"; "{} = {}", name, value);
        }
        ctx.defines.extend(entries);
        Ok(())
    }
}

/// Nested tables become dotted names; strings are code, the rest JSON.
fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten(&name, inner, out),
            Value::String(code) => out.push((name, code.clone())),
            other => out.push((name, other.to_string())),
        }
    }
}

/// `process.env.NAME` definitions. `NODE_ENV` falls back to the build mode.
fn env_definitions(
    names: &[String],
    mode: BuildMode,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<(String, String)>> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let value = match lookup(name) {
            Some(value) => value,
            None if name == "NODE_ENV" => mode.as_str().to_string(),
            None => bail!("environment variable `{name}` is not set"),
        };
        out.push((format!("process.env.{name}"), Value::String(value).to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::core::CancelFlag;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_flatten_nested_tables() {
        let Value::Object(map) = json!({
            "DEBUG": false,
            "VERSION": "\"1.2.0\"",
            "feature": { "search": true, "limits": { "max": 10 } },
        }) else {
            unreachable!()
        };
        let mut out = Vec::new();
        flatten("", &map, &mut out);
        assert_eq!(
            out,
            [
                ("DEBUG".to_string(), "false".to_string()),
                ("VERSION".to_string(), "\"1.2.0\"".to_string()),
                ("feature.search".to_string(), "true".to_string()),
                ("feature.limits.max".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_env_definitions() {
        let lookup = |name: &str| (name == "API").then(|| "https://x".to_string());
        let defs = env_definitions(
            &["NODE_ENV".into(), "API".into()],
            BuildMode::Development,
            lookup,
        )
        .unwrap();
        assert_eq!(
            defs,
            [
                ("process.env.NODE_ENV".to_string(), "\"development\"".to_string()),
                ("process.env.API".to_string(), "\"https://x\"".to_string()),
            ]
        );

        let err = env_definitions(&["MISSING".into()], BuildMode::Production, lookup).unwrap_err();
        assert!(err.to_string().contains("`MISSING`"));
    }

    #[test]
    fn test_later_define_overrides() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let mut ctx = BuildContext::new(&config, CancelFlag::new());

        let base = DefineOptions {
            definitions: serde_json::from_value(json!({ "DEBUG": true })).unwrap(),
            env: Vec::new(),
        };
        let overlay = DefineOptions {
            definitions: serde_json::from_value(json!({ "DEBUG": false })).unwrap(),
            env: Vec::new(),
        };
        Define(base).on(LifecyclePoint::ResolveConfig, &mut ctx).unwrap();
        Define(overlay).on(LifecyclePoint::ResolveConfig, &mut ctx).unwrap();
        assert_eq!(ctx.defines.get("DEBUG"), Some("false"));
    }
}
