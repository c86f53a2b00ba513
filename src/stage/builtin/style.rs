//! Style stages on lightningcss.

use super::{bool_option, js_string};
use crate::core::ModuleKind;
use crate::stage::minify::minify_css;
use crate::stage::{Asset, Stage, StageContext, StageError};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use serde_json::Value;

/// Parses and prints CSS. Option `minify` (default `false`).
pub struct Css;

impl Stage for Css {
    fn name(&self) -> &'static str {
        "css"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Style)
    }

    fn validate_options(&self, options: &Value) -> Result<(), String> {
        bool_option(options, "minify").map(drop)
    }

    fn apply(&self, asset: Asset, cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let minify = bool_option(cx.options, "minify")
            .map_err(StageError::new)?
            .unwrap_or(false);
        let code = print_css(&asset.path, asset.text()?, minify)?;
        Ok(asset.with_output(code, None))
    }
}

/// Wraps CSS into a script that appends a `<style>` element on load.
pub struct StyleInject;

impl Stage for StyleInject {
    fn name(&self) -> &'static str {
        "style-inject"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Script)
    }

    fn apply(&self, asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let code = format!(
            "(function () {{\n\
             \x20 var style = document.createElement(\"style\");\n\
             \x20 style.setAttribute(\"data-source\", {source});\n\
             \x20 style.appendChild(document.createTextNode({css}));\n\
             \x20 document.head.appendChild(style);\n\
             }})();",
            source = js_string(&asset.path),
            css = js_string(asset.text()?),
        );
        Ok(asset.with_output(code, None))
    }
}

/// Minifies a stylesheet.
pub struct MinifyCss;

impl Stage for MinifyCss {
    fn name(&self) -> &'static str {
        "minify-css"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Style)
    }

    fn apply(&self, asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let code = minify_css(asset.text()?).map_err(StageError::new)?;
        Ok(asset.with_output(code, None))
    }
}

fn print_css(path: &str, source: &str, minify: bool) -> Result<String, StageError> {
    let options = ParserOptions {
        filename: path.to_string(),
        ..ParserOptions::default()
    };
    let stylesheet =
        StyleSheet::parse(source, options).map_err(|e| StageError::new(e.to_string()))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify,
            ..PrinterOptions::default()
        })
        .map_err(|e| StageError::new(e.to_string()))?;
    Ok(result.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_css_prints_and_minifies() {
        let asset = Asset::new("styles/site.css", "body {\n  color: #ff0000;\n}\n");
        let plain = StageContext {
            options: &Value::Null,
            source_maps: false,
        };
        let out = Css.apply(asset.clone(), &plain).unwrap();
        assert!(out.text().unwrap().contains("color: red"));

        let options = json!({ "minify": true });
        let minify = StageContext {
            options: &options,
            source_maps: false,
        };
        let out = Css.apply(asset, &minify).unwrap();
        assert_eq!(out.text().unwrap(), "body{color:red}");
    }

    #[test]
    fn test_style_inject_wraps_css() {
        let cx = StageContext {
            options: &Value::Null,
            source_maps: false,
        };
        let asset = Asset::new("styles/site.css", "a{color:red}");
        let out = StyleInject.apply(asset, &cx).unwrap();
        let code = out.text().unwrap();
        assert!(code.starts_with("(function () {"));
        assert!(code.contains(r#"document.createTextNode("a{color:red}")"#));
        assert!(code.contains(r#""styles/site.css""#));
    }
}
