//! Script stages on the oxc toolchain.

use super::bool_option;
use crate::core::ModuleKind;
use crate::stage::minify::minify_js;
use crate::stage::{Asset, SourceMap, Stage, StageContext, StageError};
use oxc::allocator::Allocator;
use oxc::ast::ast::Program;
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{TransformOptions, Transformer};
use serde_json::Value;
use std::fmt::Display;
use std::path::Path;

/// Strips TypeScript syntax.
pub struct TypeScript;

impl Stage for TypeScript {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Script)
    }

    fn apply(&self, asset: Asset, cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let (code, map) = transform_typescript(&asset.path, asset.text()?, cx.source_maps)?;
        Ok(asset.with_output(code, map))
    }
}

/// Parses and reprints JavaScript, rejecting syntax errors.
pub struct JavaScript;

impl Stage for JavaScript {
    fn name(&self) -> &'static str {
        "javascript"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Script)
    }

    fn apply(&self, asset: Asset, cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let (code, map) = reprint_javascript(&asset.path, asset.text()?, cx.source_maps)?;
        Ok(asset.with_output(code, map))
    }
}

/// Validates JSON and exports it: `module.exports = {...};`.
pub struct Json;

impl Stage for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Script)
    }

    fn apply(&self, asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let value: Value = serde_json::from_slice(&asset.content)
            .map_err(|e| StageError::new(format!("invalid JSON: {e}")))?;
        let code = format!("module.exports = {value};");
        Ok(asset.with_output(code, None))
    }
}

/// Minifies a script. Option `mangle` (default `true`).
pub struct MinifyJs;

impl Stage for MinifyJs {
    fn name(&self) -> &'static str {
        "minify-js"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Script)
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        bool_option(options, "mangle").map(drop)
    }

    fn apply(&self, asset: Asset, cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let mangle = bool_option(cx.options, "mangle")
            .map_err(StageError::new)?
            .unwrap_or(true);
        let code = minify_js(asset.text()?, mangle).map_err(StageError::new)?;
        Ok(asset.with_output(code, None))
    }
}

fn first_error<E: Display>(errors: &[E]) -> Result<(), StageError> {
    match errors.first() {
        Some(err) => Err(StageError::new(err.to_string())),
        None => Ok(()),
    }
}

fn transform_typescript(
    path: &str,
    source: &str,
    source_maps: bool,
) -> Result<(String, Option<SourceMap>), StageError> {
    let path = Path::new(path);
    let source_type = SourceType::from_path(path)
        .unwrap_or_default()
        .with_typescript(true);
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    first_error(&ret.errors)?;
    let mut program = ret.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let options = TransformOptions::default();
    let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    first_error(&ret.errors)?;

    Ok(print(&program, path, source_maps))
}

fn reprint_javascript(
    path: &str,
    source: &str,
    source_maps: bool,
) -> Result<(String, Option<SourceMap>), StageError> {
    let path = Path::new(path);
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    first_error(&ret.errors)?;
    Ok(print(&ret.program, path, source_maps))
}

fn print(program: &Program<'_>, path: &Path, source_maps: bool) -> (String, Option<SourceMap>) {
    let ret = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: source_maps.then(|| path.to_path_buf()),
            ..CodegenOptions::default()
        })
        .build(program);
    let map = ret
        .map
        .and_then(|map| SourceMap::from_json_str(&map.to_json_string()));
    (ret.code, map)
}

#[cfg(test)]
mod tests {
    use super::*;

    static NO_OPTIONS: Value = Value::Null;

    fn cx(source_maps: bool) -> StageContext<'static> {
        StageContext {
            options: &NO_OPTIONS,
            source_maps,
        }
    }

    #[test]
    fn test_typescript_strips_types() {
        let asset = Asset::new(
            "src/greet.ts",
            "interface Person { name: string }\nfunction greet(p: Person): string {\n  return 'hi ' + p.name;\n}\n",
        );
        let out = TypeScript.apply(asset, &cx(false)).unwrap();
        let code = out.text().unwrap();
        assert!(code.contains("function greet(p)"));
        assert!(!code.contains("interface"));
        assert!(!code.contains(": string"));
        assert!(out.map.is_none());
    }

    #[test]
    fn test_typescript_source_map_on_request() {
        let asset = Asset::new("src/a.ts", "const a: number = 1;\n");
        let out = TypeScript.apply(asset, &cx(true)).unwrap();
        let map = out.map.expect("source map");
        assert_eq!(map.as_value()["version"], 3);
    }

    #[test]
    fn test_typescript_reports_syntax_error() {
        let asset = Asset::new("src/bad.ts", "function (: {");
        assert!(TypeScript.apply(asset, &cx(false)).is_err());
    }

    #[test]
    fn test_javascript_reprints() {
        let asset = Asset::new("src/a.js", "var  a   =  1 ;");
        let out = JavaScript.apply(asset, &cx(false)).unwrap();
        assert_eq!(out.text().unwrap().trim(), "var a = 1;");
    }

    #[test]
    fn test_json_exports_value() {
        let asset = Asset::new("data/config.json", "{ \"b\": 1, \"a\": [true] }");
        let out = Json.apply(asset, &cx(false)).unwrap();
        assert_eq!(out.text().unwrap(), r#"module.exports = {"b":1,"a":[true]};"#);

        let bad = Asset::new("data/bad.json", "{ oops }");
        let err = Json.apply(bad, &cx(false)).unwrap_err();
        assert!(err.message().starts_with("invalid JSON"));
    }

    #[test]
    fn test_minify_js_options() {
        assert!(MinifyJs.validate_options(&serde_json::json!({ "mangle": false })).is_ok());
        assert!(MinifyJs.validate_options(&serde_json::json!({ "level": 3 })).is_err());
    }
}
