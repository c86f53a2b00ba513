//! Classification and parallel transformation of source assets.

use super::error::{AssetError, AssetErrors, BuildError};
use crate::bundle::{Definitions, Module, ModuleSource};
use crate::core::{CancelFlag, ModuleKind};
use crate::logger::ProgressLine;
use crate::resolve::Resolved;
use crate::rule::{Rule, RuleTable};
use crate::stage::{Asset, SourceMap};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::PathBuf;

/// A request paired with the rule that will process it.
#[derive(Debug)]
pub struct Unit<'r> {
    pub request: Resolved,
    /// `None` for externals and for pass-through files.
    pub rule: Option<&'r Rule>,
}

impl Unit<'_> {
    /// Module kind this unit will produce.
    pub fn kind(&self) -> ModuleKind {
        match (&self.request, self.rule) {
            (Resolved::External { .. }, _) => ModuleKind::Script,
            (Resolved::File { .. }, Some(rule)) => rule.kind(),
            (Resolved::File { .. }, None) => ModuleKind::File,
        }
    }
}

/// Units to transform, plus the files strict mode turned away.
#[derive(Debug, Default)]
pub struct Classified<'r> {
    pub units: Vec<Unit<'r>>,
    pub rejected: Vec<AssetError>,
}

/// Match every request against the rule table.
///
/// Unmatched files pass through as `file` modules, or are rejected in strict
/// mode. Rejections are reported together with the transformation failures.
pub fn classify(requests: Vec<Resolved>, table: &RuleTable) -> Classified<'_> {
    let mut classified = Classified::default();

    for request in requests {
        let rule = match &request {
            Resolved::External { .. } => None,
            Resolved::File { key, .. } => match table.classify(key) {
                Some(rule) => {
                    crate::debug!("rule"; "{} → rule #{} {:?}", key, rule.index(), rule.chain());
                    Some(rule)
                }
                None if table.is_strict() => {
                    classified.rejected.push(AssetError::unmatched(key.clone()));
                    continue;
                }
                None => {
                    crate::debug!("rule"; "{} → no rule, emitted as file", key);
                    None
                }
            },
        };
        classified.units.push(Unit { request, rule });
    }
    classified
}

/// Settings shared by all transformation units.
pub struct TransformEnv<'a> {
    pub defines: &'a Definitions,
    pub source_maps: bool,
    pub cancel: &'a CancelFlag,
    pub progress: Option<&'a ProgressLine>,
}

enum UnitError {
    Asset(AssetError),
    Resource(PathBuf, io::Error),
    Cancelled,
}

/// Transform every unit on `pool`, keeping the input order.
///
/// All units are attempted. Asset failures are aggregated with the
/// `rejected` ones; an unreadable file or cancellation fails the build as a
/// whole.
pub fn transform_all(
    units: &[Unit<'_>],
    rejected: Vec<AssetError>,
    env: &TransformEnv<'_>,
    pool: &rayon::ThreadPool,
) -> Result<Vec<Module>, BuildError> {
    let results: Vec<Result<Module, UnitError>> =
        pool.install(|| units.par_iter().map(|unit| transform_one(unit, env)).collect());

    let mut modules = Vec::with_capacity(results.len());
    let mut errors = rejected;
    for result in results {
        match result {
            Ok(module) => modules.push(module),
            Err(UnitError::Asset(err)) => errors.push(err),
            Err(UnitError::Resource(path, source)) => {
                return Err(BuildError::resource(path, source));
            }
            Err(UnitError::Cancelled) => return Err(BuildError::Cancelled),
        }
    }

    if errors.is_empty() {
        Ok(modules)
    } else {
        Err(BuildError::Assets(AssetErrors::new(errors)))
    }
}

fn transform_one(unit: &Unit<'_>, env: &TransformEnv<'_>) -> Result<Module, UnitError> {
    if env.cancel.is_cancelled() {
        return Err(UnitError::Cancelled);
    }

    let (path, key) = match &unit.request {
        Resolved::External { request, global } => {
            return Ok(Module::external(request, global));
        }
        Resolved::File { path, key } => (path, key),
    };

    let bytes = fs::read(path).map_err(|err| UnitError::Resource(path.clone(), err))?;
    let source = ModuleSource::File(path.clone());

    let Some(rule) = unit.rule else {
        inc(env, ModuleKind::File);
        return Ok(Module::new(key.as_str(), ModuleKind::File, source, bytes));
    };

    let mut asset = Asset::new(key.as_str(), bytes);
    if env.source_maps {
        if let Ok(text) = std::str::from_utf8(&asset.content) {
            asset.map = Some(SourceMap::identity(key, text));
        }
    }

    let output = match rule.chain().execute(asset, env.source_maps) {
        Ok(output) => output,
        Err(failure) => {
            if let Some(progress) = env.progress {
                progress.fail(rule.kind().name());
            }
            return Err(UnitError::Asset(AssetError::stage(
                key.as_str(),
                failure.stage,
                failure.error.message(),
            )));
        }
    };

    let kind = rule.kind();
    let mut module = Module::new(key.as_str(), kind, source, output.content);
    if env.source_maps && kind.is_text() {
        module.map = output.map;
    }

    if kind == ModuleKind::Script && !env.defines.is_empty() {
        if let Some(code) = env.defines.apply(&module.text()) {
            module.set_code(code);
        }
    }

    inc(env, kind);
    Ok(module)
}

#[inline]
fn inc(env: &TransformEnv<'_>, kind: ModuleKind) {
    if let Some(progress) = env.progress {
        progress.inc(kind.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigDiagnostics, ModuleConfig};
    use crate::stage::StageRegistry;
    use serde_json::json;
    use tempfile::TempDir;

    fn table(rules: serde_json::Value, strict: bool) -> RuleTable {
        let config: ModuleConfig =
            serde_json::from_value(json!({ "rules": rules, "strict": strict })).unwrap();
        let mut diag = ConfigDiagnostics::new();
        let table = RuleTable::compile(&config, &StageRegistry::builtin(), &mut diag);
        assert!(!diag.has_errors());
        table
    }

    fn file(dir: &TempDir, key: &str, content: &str) -> Resolved {
        let path = dir.path().join(key);
        fs::write(&path, content).unwrap();
        Resolved::File {
            path,
            key: key.into(),
        }
    }

    fn pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn env<'a>(defines: &'a Definitions, cancel: &'a CancelFlag, source_maps: bool) -> TransformEnv<'a> {
        TransformEnv {
            defines,
            source_maps,
            cancel,
            progress: None,
        }
    }

    #[test]
    fn test_classify_strict_rejects_unmatched() {
        let dir = TempDir::new().unwrap();
        let requests = vec![file(&dir, "a.js", "a()"), file(&dir, "b.bin", "\0")];

        let lenient = table(json!([{ "test": "\\.js$", "use": "identity" }]), false);
        let classified = classify(requests.clone(), &lenient);
        assert!(classified.rejected.is_empty());
        assert_eq!(classified.units[0].kind(), ModuleKind::Script);
        assert_eq!(classified.units[1].kind(), ModuleKind::File);

        let strict = table(json!([{ "test": "\\.js$", "use": "identity" }]), true);
        let classified = classify(requests, &strict);
        assert_eq!(classified.units.len(), 1);
        assert_eq!(classified.rejected.len(), 1);
        assert_eq!(classified.rejected[0].path, "b.bin");
    }

    #[test]
    fn test_rejected_and_stage_failures_reported_together() {
        let dir = TempDir::new().unwrap();
        let table = table(json!([{ "test": "\\.json$", "use": "json" }]), true);
        let requests = vec![file(&dir, "bad.json", "{ broken"), file(&dir, "logo.png", "png")];
        let Classified { units, rejected } = classify(requests, &table);
        let defines = Definitions::default();
        let cancel = CancelFlag::new();

        match transform_all(&units, rejected, &env(&defines, &cancel, false), &pool()) {
            Err(BuildError::Assets(errors)) => {
                let failed: Vec<_> = errors.iter().map(|e| (e.path.as_str(), e.stage.as_deref())).collect();
                assert_eq!(failed, [("bad.json", Some("json")), ("logo.png", None)]);
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_transform_keeps_order_and_applies_defines() {
        let dir = TempDir::new().unwrap();
        let table = table(json!([{ "test": "\\.js$", "use": "identity" }]), false);
        let requests = vec![
            file(&dir, "a.js", "if (DEBUG) log();"),
            Resolved::External {
                request: "jquery".into(),
                global: "jQuery".into(),
            },
            file(&dir, "b.js", "b()"),
        ];
        let units = classify(requests, &table).units;
        let defines = Definitions::new([("DEBUG".to_string(), "false".to_string())]);
        let cancel = CancelFlag::new();

        let modules = transform_all(&units, Vec::new(), &env(&defines, &cancel, false), &pool()).unwrap();
        let keys: Vec<_> = modules.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, ["a.js", "external:jquery", "b.js"]);
        assert_eq!(modules[0].text(), "if (false) log();");
    }

    #[test]
    fn test_transform_aggregates_stage_failures() {
        let dir = TempDir::new().unwrap();
        let table = table(json!([{ "test": "\\.json$", "use": "json" }]), false);
        let requests = vec![
            file(&dir, "z.json", "{ broken"),
            file(&dir, "ok.json", "{\"a\": 1}"),
            file(&dir, "a.json", "[1,"),
        ];
        let units = classify(requests, &table).units;
        let cancel = CancelFlag::new();
        let defines = Definitions::default();

        match transform_all(&units, Vec::new(), &env(&defines, &cancel, false), &pool()) {
            Err(BuildError::Assets(errors)) => {
                let failed: Vec<_> = errors.iter().map(|e| (e.path.as_str(), e.stage.as_deref())).collect();
                assert_eq!(failed, [("a.json", Some("json")), ("z.json", Some("json"))]);
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let dir = TempDir::new().unwrap();
        let table = table(json!([]), false);
        let units = classify(
            vec![Resolved::File {
                path: dir.path().join("gone.js"),
                key: "gone.js".into(),
            }],
            &table,
        )
        .units;
        let cancel = CancelFlag::new();
        let defines = Definitions::default();
        assert!(matches!(
            transform_all(&units, Vec::new(), &env(&defines, &cancel, false), &pool()),
            Err(BuildError::Resource { .. })
        ));
    }

    #[test]
    fn test_source_maps_seeded_for_text() {
        let dir = TempDir::new().unwrap();
        let table = table(json!([{ "test": "\\.js$", "use": "identity" }]), false);
        let units = classify(vec![file(&dir, "a.js", "a();\nb();")], &table).units;
        let cancel = CancelFlag::new();
        let defines = Definitions::default();
        let modules = transform_all(&units, Vec::new(), &env(&defines, &cancel, true), &pool()).unwrap();
        let map = modules[0].map.as_ref().unwrap();
        assert_eq!(map.as_value()["sources"][0], "a.js");
    }
}
