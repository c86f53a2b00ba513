//! Transformed modules.

use crate::core::ModuleKind;
use crate::stage::SourceMap;
use crate::utils::hash::ContentHash;
use std::borrow::Cow;
use std::path::PathBuf;

/// Where a module's code came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    /// Source file (absolute path).
    File(PathBuf),
    /// Global provided by the host page.
    External { request: String, global: String },
}

#[derive(Debug, Clone)]
pub struct Module {
    /// Stable identity: root-relative path, or `external:<request>`.
    pub key: String,
    /// Runtime id (sequential, or hashed by `hashed-module-ids`).
    pub id: String,
    pub kind: ModuleKind,
    pub source: ModuleSource,
    pub code: Vec<u8>,
    pub map: Option<SourceMap>,
}

impl Module {
    pub fn new(key: impl Into<String>, kind: ModuleKind, source: ModuleSource, code: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            id: String::new(),
            kind,
            source,
            code,
            map: None,
        }
    }

    /// Module re-exporting a host global.
    pub fn external(request: &str, global: &str) -> Self {
        Self::new(
            format!("external:{request}"),
            ModuleKind::Script,
            ModuleSource::External {
                request: request.to_string(),
                global: global.to_string(),
            },
            format!("module.exports = {global};").into_bytes(),
        )
    }

    pub fn is_external(&self) -> bool {
        matches!(self.source, ModuleSource::External { .. })
    }

    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(&self.code)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.code)
    }

    /// Replace the code; the source map no longer applies.
    pub fn set_code(&mut self, code: impl Into<Vec<u8>>) {
        self.code = code.into();
        self.map = None;
    }

    /// File name without directories (`src/img/logo.png` → `logo.png`).
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// `(stem, extension)` of the file name; the extension may be empty.
    pub fn stem_and_ext(&self) -> (&str, &str) {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => (name, ""),
            Some(dot) => (&name[..dot], &name[dot + 1..]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_module() {
        let module = Module::external("jquery", "jQuery");
        assert_eq!(module.key, "external:jquery");
        assert!(module.is_external());
        assert_eq!(module.text(), "module.exports = jQuery;");
    }

    #[test]
    fn test_stem_and_ext() {
        let file = |key: &str| {
            Module::new(key, ModuleKind::File, ModuleSource::File(key.into()), Vec::new())
        };
        assert_eq!(file("img/logo.min.png").stem_and_ext(), ("logo.min", "png"));
        assert_eq!(file("LICENSE").stem_and_ext(), ("LICENSE", ""));
        assert_eq!(file("fonts/.hidden").stem_and_ext(), (".hidden", ""));
    }

    #[test]
    fn test_set_code_drops_map() {
        let mut module = Module::new("a.js", ModuleKind::Script, ModuleSource::File("a.js".into()), b"a".to_vec());
        module.map = Some(SourceMap::identity("a.js", "a"));
        let before = module.content_hash();
        module.set_code("b");
        assert!(module.map.is_none());
        assert_ne!(module.content_hash(), before);
    }
}
