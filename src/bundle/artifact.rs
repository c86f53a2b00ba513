//! The output set: every file a build will publish.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt;

/// Characters escaped in URL path segments (`/` is kept).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Script,
    Style,
    File,
    SourceMap,
    /// Written by a plugin (host page, manifest).
    Generated,
}

impl ArtifactKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
            Self::File => "file",
            Self::SourceMap => "map",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the output directory, `/`-separated (may climb out
    /// with `..` for generated files).
    pub file_name: String,
    /// Logical name (`index.js`, `index.css`, `img/logo.png`).
    pub logical_name: String,
    pub kind: ArtifactKind,
    /// Owning chunk, for script/style/map artifacts.
    pub chunk: Option<String>,
    pub bytes: Vec<u8>,
}

/// Public URL of an output file: `public_path` + percent-encoded name.
pub fn public_url(public_path: &str, file_name: &str) -> String {
    format!("{public_path}{}", utf8_percent_encode(file_name, PATH_SEGMENT))
}

/// Artifacts in emission order.
#[derive(Debug, Clone, Default)]
pub struct OutputSet {
    artifacts: Vec<Artifact>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn find(&self, file_name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }

    /// Script and style artifacts of `chunk`, in emission order.
    pub fn chunk_artifacts<'a>(&'a self, chunk: &'a str) -> impl Iterator<Item = &'a Artifact> + 'a {
        self.artifacts.iter().filter(move |a| {
            a.chunk.as_deref() == Some(chunk)
                && matches!(a.kind, ArtifactKind::Script | ArtifactKind::Style)
        })
    }

    /// Total size in bytes.
    pub fn total_size(&self) -> usize {
        self.artifacts.iter().map(|a| a.bytes.len()).sum()
    }
}

impl IntoIterator for OutputSet {
    type Item = Artifact;
    type IntoIter = std::vec::IntoIter<Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.into_iter()
    }
}
