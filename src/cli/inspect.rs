//! `razorpack inspect`.
//!
//! Without paths: the effective configuration (base + overlay, defaults
//! filled in, mode resolved) as JSON. With paths: how each path is
//! classified by the rule table.

use super::{Cli, InspectArgs, load_config};
use crate::config::PackConfig;
use crate::core::ModuleKind;
use crate::rule::RuleTable;
use crate::stage::StageRegistry;
use anyhow::Result;
use serde_json::{Value, json};
use std::process::ExitCode;

pub fn run_inspect(cli: &Cli, args: &InspectArgs) -> Result<ExitCode> {
    let config = load_config(cli, &args.config)?;

    let output = if args.paths.is_empty() {
        effective_config(&config)?
    } else {
        let mut diag = config.validate();
        let table = RuleTable::compile(&config.module, &StageRegistry::builtin(), &mut diag);
        diag.into_result()?;
        classification(&table, &args.paths)
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

fn effective_config(config: &PackConfig) -> Result<Value> {
    let mut value = serde_json::to_value(config)?;
    if let Value::Object(map) = &mut value {
        map.insert("config_path".into(), json!(config.config_path));
        map.insert("overlay_path".into(), json!(config.overlay_path));
    }
    Ok(value)
}

fn classification(table: &RuleTable, paths: &[String]) -> Value {
    let rows = paths
        .iter()
        .map(|path| {
            let normalized = path.replace('\\', "/");
            match table.classify(&normalized) {
                Some(rule) => json!({
                    "path": normalized,
                    "rule": rule.index(),
                    "test": rule.pattern(),
                    "stages": rule.chain().names().collect::<Vec<_>>(),
                    "kind": rule.kind().name(),
                }),
                None => json!({
                    "path": normalized,
                    "rule": Value::Null,
                    "kind": if table.is_strict() { "rejected" } else { ModuleKind::File.name() },
                }),
            }
        })
        .collect();
    Value::Array(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use tempfile::TempDir;

    const RULES: &str = r#"
entry = "a.ts"

[[module.rules]]
test = '\.ts$'
use = ["typescript", "identity"]

[[module.rules]]
test = '\.(ts|css)$'
use = "css"
"#;

    #[test]
    fn test_classification_first_match_wins() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config(RULES, dir.path());
        let mut diag = ConfigDiagnostics::new();
        let table = RuleTable::compile(&config.module, &StageRegistry::builtin(), &mut diag);
        assert!(!diag.has_errors());

        let rows = classification(&table, &["src\\a.ts".into(), "b.css".into(), "logo.png".into()]);
        assert_eq!(rows[0]["path"], "src/a.ts");
        assert_eq!(rows[0]["rule"], 0);
        assert_eq!(rows[0]["stages"], json!(["typescript", "identity"]));
        assert_eq!(rows[1]["rule"], 1);
        assert_eq!(rows[1]["kind"], "style");
        assert_eq!(rows[2]["rule"], Value::Null);
        assert_eq!(rows[2]["kind"], "file");
    }

    #[test]
    fn test_effective_config_has_defaults() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.ts\"\n", dir.path());
        let value = effective_config(&config).unwrap();
        assert_eq!(value["mode"], "production");
        assert_eq!(value["output"]["format"], "concat");
        assert_eq!(value["entry"]["main"], "a.ts");
        assert!(value["config_path"].as_str().unwrap().ends_with("razorpack.toml"));
    }
}
