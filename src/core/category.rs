//! Module kind definitions.

use serde::{Deserialize, Serialize};

/// Kind of a transformed module, determines which artifact it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Bundled into the entry's script chunk.
    Script,
    /// Extracted into the entry's stylesheet.
    Style,
    /// Emitted as its own file under `output.asset_filename`.
    File,
}

impl ModuleKind {
    /// Display name for this module kind (also the progress counter name).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::File => "file",
        }
    }

    /// Extension of the artifact this kind renders into.
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::Script => Some("js"),
            Self::Style => Some("css"),
            Self::File => None,
        }
    }

    /// Whether the module's bytes are text.
    #[inline]
    pub const fn is_text(self) -> bool {
        !matches!(self, Self::File)
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
