use super::js_string;
use crate::core::ModuleKind;
use crate::stage::{Asset, Stage, StageContext, StageError};

/// Exports markup as a string: `module.exports = "<html>";`.
pub struct Html;

impl Stage for Html {
    fn name(&self) -> &'static str {
        "html"
    }

    fn produces(&self) -> Option<ModuleKind> {
        Some(ModuleKind::Script)
    }

    fn apply(&self, asset: Asset, _cx: &StageContext<'_>) -> Result<Asset, StageError> {
        let code = format!("module.exports = {};", js_string(asset.text()?));
        Ok(asset.with_output(code, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_html_exports_string() {
        let cx = StageContext {
            options: &Value::Null,
            source_maps: false,
        };
        let asset = Asset::new("views/row.html", "<tr class=\"row\">\n</tr>");
        let out = Html.apply(asset, &cx).unwrap();
        assert_eq!(
            out.text().unwrap(),
            r#"module.exports = "<tr class=\"row\">\n</tr>";"#
        );
    }
}
