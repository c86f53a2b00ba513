//! Source map values (revision 3) carried alongside module code.
//!
//! Maps are kept as JSON trees; chunk maps are index maps whose sections
//! point at the per-module maps at their line offsets.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap(Value);

impl SourceMap {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok().map(Self)
    }

    /// Line-for-line map of unchanged text onto itself.
    pub fn identity(source: &str, content: &str) -> Self {
        let lines = content.lines().count().max(1);
        let mut mappings = String::with_capacity(lines * 5);
        for line in 0..lines {
            if line > 0 {
                mappings.push(';');
            }
            // first segment: column 0, source 0, line 0, column 0;
            // later lines advance the source line by one
            mappings.push_str(if line == 0 { "AAAA" } else { "AACA" });
        }
        Self(json!({
            "version": 3,
            "sources": [source],
            "sourcesContent": [content],
            "names": [],
            "mappings": mappings,
        }))
    }

    /// Index map from `(line offset, map)` sections, in ascending offset order.
    pub fn index(file: &str, sections: Vec<(usize, SourceMap)>) -> Self {
        let sections: Vec<Value> = sections
            .into_iter()
            .map(|(line, map)| {
                json!({
                    "offset": { "line": line, "column": 0 },
                    "map": map.0,
                })
            })
            .collect();
        Self(json!({
            "version": 3,
            "file": file,
            "sections": sections,
        }))
    }

    /// Set the generated file's name.
    pub fn set_file(&mut self, file: &str) {
        if let Value::Object(fields) = &mut self.0 {
            fields.insert("file".into(), Value::String(file.to_owned()));
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn to_json(&self) -> String {
        self.0.to_string()
    }

    /// `data:` URL for an inline `sourceMappingURL` comment.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(self.to_json())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mappings_follow_lines() {
        let map = SourceMap::identity("src/a.js", "a();\nb();\nc();\n");
        assert_eq!(map.as_value()["mappings"], "AAAA;AACA;AACA");
        assert_eq!(map.as_value()["sources"][0], "src/a.js");
        assert_eq!(map.as_value()["sourcesContent"][0], "a();\nb();\nc();\n");
    }

    #[test]
    fn test_index_map_sections() {
        let a = SourceMap::identity("a.js", "a();");
        let b = SourceMap::identity("b.js", "b();");
        let index = SourceMap::index("index.js", vec![(0, a), (3, b)]);
        let sections = index.as_value()["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1]["offset"]["line"], 3);
        assert_eq!(sections[1]["map"]["sources"][0], "b.js");
    }

    #[test]
    fn test_data_url_is_base64_json() {
        let map = SourceMap::identity("a.js", "a();");
        let url = map.to_data_url();
        let encoded = url.rsplit(',').next().unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        let value: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["version"], 3);
    }
}
