//! Chunk rendering: module code → named, hashed artifacts.
//!
//! # Formats
//!
//! - `concat`: module code joined with `\n`, in chunk order. Externals are
//!   left to the host page.
//! - `modules`: factories registered into a shared namespace object, an
//!   optional runtime copy, then `require` calls for the entry modules (the
//!   last one bound to `output.library`).
//!
//! Hashes are taken over the rendered code before any `sourceMappingURL`
//! comment is appended.

use super::artifact::{Artifact, ArtifactKind, OutputSet, public_url};
use super::chunk::{Chunk, ModuleGraph, ModuleIdx};
use super::substitute::{ProvideBinding, references, replace_identifier};
use crate::config::{Devtool, LibraryTarget, OutputConfig, OutputFormat, PackConfig};
use crate::core::ModuleKind;
use crate::embed::MODULE_RUNTIME;
use crate::resolve::{TemplateError, Tokens, resolve_output_path};
use crate::stage::SourceMap;
use crate::utils::hash::{CompositeHasher, ContentHash};
use rustc_hash::FxHashMap;
use std::fmt::Write;
use thiserror::Error;

const ROOT_EXPR: &str = r#"(typeof self !== "undefined" ? self : this)"#;
const REQUIRE_PARAM: &str = "__razorpack_require__";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot name {what}")]
    Template {
        what: String,
        #[source]
        source: TemplateError,
    },

    #[error("`{first}` and `{second}` both render to `{file}`")]
    Collision {
        file: String,
        first: String,
        second: String,
    },
}

/// Render every chunk (and every file module) of `graph`.
pub fn render(
    graph: &ModuleGraph,
    provides: &[ProvideBinding],
    config: &PackConfig,
) -> Result<OutputSet, RenderError> {
    let mut renderer = Renderer {
        graph,
        provides,
        output: &config.output,
        devtool: config.devtool,
        namespace: runtime_namespace(&config.output),
        out: OutputSet::new(),
        names: FxHashMap::default(),
        file_urls: FxHashMap::default(),
    };

    renderer.render_files()?;
    for idx in graph.load_order() {
        let chunk = &graph.chunks[idx];
        renderer.render_styles(chunk)?;
        renderer.render_script(chunk)?;
    }
    Ok(renderer.out)
}

/// Global property holding the module registry.
pub fn runtime_namespace(output: &OutputConfig) -> String {
    format!("__razorpack_{}__", output.library.as_deref().unwrap_or("modules"))
}

struct Renderer<'a> {
    graph: &'a ModuleGraph,
    provides: &'a [ProvideBinding],
    output: &'a OutputConfig,
    devtool: Devtool,
    namespace: String,
    out: OutputSet,
    /// file name → logical name that claimed it
    names: FxHashMap<String, String>,
    /// file module → public URL
    file_urls: FxHashMap<ModuleIdx, String>,
}

/// Code under construction plus source map sections at line offsets.
#[derive(Default)]
struct CodeBuilder {
    code: String,
    lines: usize,
    sections: Vec<(usize, SourceMap)>,
}

impl CodeBuilder {
    fn push(&mut self, text: &str) {
        self.lines += text.matches('\n').count();
        self.code.push_str(text);
    }

    fn push_module(&mut self, code: &str, map: Option<&SourceMap>) {
        if let Some(map) = map {
            self.sections.push((self.lines, map.clone()));
        }
        self.push(code);
    }

    fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

impl Renderer<'_> {
    fn hash(&self, hash: ContentHash) -> String {
        hash.short(self.output.hash_length)
    }

    fn claim(&mut self, file_name: &str, logical: &str) -> Result<(), RenderError> {
        if let Some(first) = self.names.get(file_name) {
            return Err(RenderError::Collision {
                file: file_name.to_string(),
                first: first.clone(),
                second: logical.to_string(),
            });
        }
        self.names.insert(file_name.to_string(), logical.to_string());
        Ok(())
    }

    fn render_files(&mut self) -> Result<(), RenderError> {
        let graph = self.graph;
        for (idx, module) in graph.used_modules() {
            if module.kind != ModuleKind::File {
                continue;
            }
            let (stem, ext) = module.stem_and_ext();
            let hash = self.hash(module.content_hash());
            let tokens = Tokens {
                name: Some(stem),
                ext: Some(ext),
                content_hash: Some(&hash),
                chunk_hash: None,
            };
            let file_name = resolve_output_path(&self.output.asset_filename, &tokens).map_err(
                |source| RenderError::Template {
                    what: format!("asset `{}`", module.key),
                    source,
                },
            )?;

            // identical files under one hashed name are emitted once
            if let Some(existing) = self.out.find(&file_name) {
                if existing.bytes == module.code {
                    self.file_urls
                        .insert(idx, public_url(&self.output.public_path, &file_name));
                    continue;
                }
            }
            self.claim(&file_name, &module.key)?;

            self.file_urls
                .insert(idx, public_url(&self.output.public_path, &file_name));
            self.out.push(Artifact {
                file_name,
                logical_name: module.key.clone(),
                kind: ArtifactKind::File,
                chunk: None,
                bytes: module.code.clone(),
            });
        }
        Ok(())
    }

    fn render_styles(&mut self, chunk: &Chunk) -> Result<(), RenderError> {
        let graph = self.graph;
        let mut builder = CodeBuilder::default();
        for (i, &idx) in chunk
            .modules
            .iter()
            .filter(|&&idx| graph.module(idx).kind == ModuleKind::Style)
            .enumerate()
        {
            if i > 0 {
                builder.push("\n");
            }
            let module = graph.module(idx);
            builder.push_module(&module.text(), module.map.as_ref());
        }
        if builder.is_empty() {
            return Ok(());
        }
        self.finish(chunk, builder, ArtifactKind::Style)
    }

    fn render_script(&mut self, chunk: &Chunk) -> Result<(), RenderError> {
        let builder = match self.output.format {
            OutputFormat::Concat => self.concat_script(chunk),
            OutputFormat::Modules => self.modules_script(chunk),
        };
        if builder.is_empty() {
            return Ok(());
        }
        self.finish(chunk, builder, ArtifactKind::Script)
    }

    fn concat_script(&self, chunk: &Chunk) -> CodeBuilder {
        let graph = self.graph;
        let mut builder = CodeBuilder::default();
        let scripts = chunk.modules.iter().map(|&idx| graph.module(idx)).filter(|m| {
            m.kind == ModuleKind::Script && !m.is_external()
        });
        for (i, module) in scripts.enumerate() {
            if i > 0 {
                builder.push("\n");
            }
            builder.push_module(&module.text(), module.map.as_ref());
        }
        builder
    }

    fn modules_script(&self, chunk: &Chunk) -> CodeBuilder {
        let graph = self.graph;
        let ns = js_string(&self.namespace);
        let mut builder = CodeBuilder::default();

        if chunk.has_runtime {
            builder.push(&MODULE_RUNTIME.render(&self.namespace));
            builder.push("\n");
        }

        let registered: Vec<ModuleIdx> = chunk
            .modules
            .iter()
            .copied()
            .filter(|&idx| graph.module(idx).kind != ModuleKind::Style)
            .collect();

        if !registered.is_empty() {
            builder.push(&format!(
                "(function (root, modules) {{\n\
                 var ns = root[{ns}] || (root[{ns}] = {{ modules: {{}}, cache: {{}} }});\n\
                 for (var id in modules) ns.modules[id] = modules[id];\n\
                 }})({ROOT_EXPR}, {{\n"
            ));
            for idx in registered {
                self.push_factory(&mut builder, idx);
            }
            builder.push("});\n");
        }

        let runnable: Vec<ModuleIdx> = chunk
            .entry_modules
            .iter()
            .copied()
            .filter(|&idx| graph.module(idx).kind != ModuleKind::Style)
            .collect();
        let library = self.output.library.as_deref().filter(|_| !chunk.commons);

        for (i, &idx) in runnable.iter().enumerate() {
            let call = format!(
                "{ROOT_EXPR}[{ns}].require({})",
                js_string(&graph.module(idx).id)
            );
            let is_last = i + 1 == runnable.len();
            let line = match library {
                Some(name) if is_last => match self.output.library_target {
                    LibraryTarget::Var => format!("var {name} = {call};\n"),
                    LibraryTarget::Assign => format!("{name} = {call};\n"),
                    LibraryTarget::Window => format!("window[{}] = {call};\n", js_string(name)),
                },
                _ => format!("{call};\n"),
            };
            builder.push(&line);
        }

        builder
    }

    /// `"id": function (module, exports, __razorpack_require__) { ... },`
    fn push_factory(&self, builder: &mut CodeBuilder, idx: ModuleIdx) {
        let graph = self.graph;
        let module = graph.module(idx);
        builder.push(&format!(
            "{}: function (module, exports, {REQUIRE_PARAM}) {{\n",
            js_string(&module.id)
        ));

        match module.kind {
            ModuleKind::File => {
                let url = self.file_urls.get(&idx).map(String::as_str).unwrap_or("");
                builder.push(&format!("module.exports = {};", js_string(url)));
            }
            _ => {
                let mut code = module.text().into_owned();
                let mut prologue = String::new();
                let mut rewritten = false;

                for binding in self.provides {
                    let Some(target) = graph.index_of(&binding.target) else {
                        continue;
                    };
                    if target == idx || !references(&code, &binding.name) {
                        continue;
                    }
                    let call = format!("{REQUIRE_PARAM}({})", js_string(&graph.module(target).id));
                    if binding.is_dotted() {
                        code = replace_identifier(&code, &binding.name, &call).into_owned();
                        rewritten = true;
                    } else {
                        let _ = writeln!(prologue, "var {} = {call};", binding.name);
                    }
                }

                builder.push(&prologue);
                let map = module.map.as_ref().filter(|_| !rewritten);
                builder.push_module(&code, map);
            }
        }
        builder.push("\n},\n");
    }

    fn finish(
        &mut self,
        chunk: &Chunk,
        builder: CodeBuilder,
        kind: ArtifactKind,
    ) -> Result<(), RenderError> {
        let (template, ext) = match kind {
            ArtifactKind::Style => (&self.output.style_filename, "css"),
            _ => (&self.output.filename, "js"),
        };
        let logical = format!("{}.{ext}", chunk.name);

        let CodeBuilder { mut code, sections, .. } = builder;
        // `file` is renamed once the hashed name is known
        let mut map = (self.devtool.enabled() && !sections.is_empty())
            .then(|| SourceMap::index(&logical, sections));

        let (content_hash, chunk_hash) = match &map {
            None => (ContentHash::of(&code), self.graph.chunk_hash(chunk)),
            Some(map) => {
                let map_json = map.to_json();
                (
                    CompositeHasher::new().field(&code).field(&map_json).finish(),
                    CompositeHasher::new()
                        .field(self.graph.chunk_hash(chunk).to_hex())
                        .field(&map_json)
                        .finish(),
                )
            }
        };
        let content_hash = self.hash(content_hash);
        let chunk_hash = self.hash(chunk_hash);
        let tokens = Tokens {
            name: Some(&chunk.name),
            ext: Some(ext),
            content_hash: Some(&content_hash),
            chunk_hash: Some(&chunk_hash),
        };
        let file_name =
            resolve_output_path(template, &tokens).map_err(|source| RenderError::Template {
                what: format!("chunk `{}`", chunk.name),
                source,
            })?;
        self.claim(&file_name, &logical)?;

        if let Some(map) = map.as_mut() {
            let base_name = file_name.rsplit('/').next().unwrap_or(&file_name);
            map.set_file(base_name);
            let map_name = format!("{file_name}.map");

            let url = match self.devtool {
                Devtool::InlineSourceMap => Some(map.to_data_url()),
                Devtool::SourceMap => Some(format!("{base_name}.map")),
                Devtool::HiddenSourceMap | Devtool::Off => None,
            };
            if let Some(url) = url {
                code.push_str(&map_comment(kind, &url));
            }
            if self.devtool != Devtool::InlineSourceMap {
                self.claim(&map_name, &format!("{logical}.map"))?;
                self.out.push(Artifact {
                    file_name: map_name,
                    logical_name: format!("{logical}.map"),
                    kind: ArtifactKind::SourceMap,
                    chunk: Some(chunk.name.clone()),
                    bytes: map.to_json().into_bytes(),
                });
            }
        }

        self.out.push(Artifact {
            file_name,
            logical_name: logical,
            kind,
            chunk: Some(chunk.name.clone()),
            bytes: code.into_bytes(),
        });
        Ok(())
    }
}

fn map_comment(kind: ArtifactKind, url: &str) -> String {
    match kind {
        ArtifactKind::Style => format!("\n/*# sourceMappingURL={url} */"),
        _ => format!("\n//# sourceMappingURL={url}"),
    }
}

fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::module::{Module, ModuleSource};
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    fn module(key: &str, kind: ModuleKind, code: &str) -> Module {
        Module::new(key, kind, ModuleSource::File(key.into()), code.as_bytes().to_vec())
    }

    fn single_chunk(modules: Vec<Module>) -> ModuleGraph {
        let mut graph = ModuleGraph::new();
        let members: Vec<_> = modules.into_iter().map(|m| graph.add_module(m)).collect();
        graph.chunks.push(Chunk::entry("index", members, true));
        graph
    }

    #[test]
    fn test_concat_single_module_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config(
            "entry = \"a.ts\"\n[output]\nfilename = \"[name].[hash].js\"\n",
            dir.path(),
        );
        let graph = single_chunk(vec![module("a.ts", ModuleKind::Script, "let a = 1;\n")]);
        let out = render(&graph, &[], &config).unwrap();

        assert_eq!(out.len(), 1);
        let artifact = out.iter().next().unwrap();
        assert_eq!(artifact.bytes, b"let a = 1;\n");
        let hash = ContentHash::of("let a = 1;\n").short(20);
        assert_eq!(artifact.file_name, format!("index.{hash}.js"));
    }

    #[test]
    fn test_styles_and_files_split_out() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config(
            "entry = \"a.js\"\n[output]\nasset_filename = \"img/[name].[hash:8].[ext]\"\nstyle_filename = \"[name].css\"\nfilename = \"[name].js\"\n",
            dir.path(),
        );
        let graph = single_chunk(vec![
            module("a.js", ModuleKind::Script, "a();"),
            module("site.css", ModuleKind::Style, "a{}"),
            module("b.js", ModuleKind::Script, "b();"),
            module("img/logo.png", ModuleKind::File, "PNG"),
        ]);
        let out = render(&graph, &[], &config).unwrap();
        let names: Vec<_> = out.iter().map(|a| a.file_name.as_str()).collect();
        let logo = format!("img/logo.{}.png", ContentHash::of("PNG").short(8));
        assert_eq!(names, [logo.as_str(), "index.css", "index.js"]);
        assert_eq!(out.find("index.js").unwrap().bytes, b"a();\nb();");
    }

    #[test]
    fn test_modules_format_registers_and_binds_library() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config(
            "entry = \"a.js\"\n[output]\nformat = \"modules\"\nfilename = \"[name].js\"\nlibrary = \"app\"\n",
            dir.path(),
        );
        let mut graph = ModuleGraph::new();
        let jq = graph.add_module(module("jquery.js", ModuleKind::Script, "module.exports = 'jq';"));
        let a = graph.add_module(module("a.js", ModuleKind::Script, "$(go);\nwindow.jQuery.fn;"));
        graph.chunks.push(Chunk::entry("index", vec![jq, a], true));

        let provides = [
            ProvideBinding {
                name: "$".into(),
                target: "jquery.js".into(),
            },
            ProvideBinding {
                name: "window.jQuery".into(),
                target: "jquery.js".into(),
            },
        ];
        let out = render(&graph, &provides, &config).unwrap();
        let code = String::from_utf8(out.find("index.js").unwrap().bytes.clone()).unwrap();

        assert!(code.contains("__razorpack_app__"));
        assert!(code.contains("\"1\": function (module, exports, __razorpack_require__) {\nvar $ = __razorpack_require__(\"0\");\n$(go);\n__razorpack_require__(\"0\").fn;"));
        assert!(code.contains("(typeof self !== \"undefined\" ? self : this)[\"__razorpack_app__\"].require(\"0\");\n"));
        assert!(code.ends_with("var app = (typeof self !== \"undefined\" ? self : this)[\"__razorpack_app__\"].require(\"1\");\n"));
    }

    #[test]
    fn test_inline_source_map() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config(
            "entry = \"a.js\"\ndevtool = \"inline-source-map\"\n[output]\nfilename = \"[name].js\"\n",
            dir.path(),
        );
        let mut a = module("a.js", ModuleKind::Script, "a();");
        a.map = Some(SourceMap::identity("a.js", "a();"));
        let out = render(&single_chunk(vec![a]), &[], &config).unwrap();
        assert_eq!(out.len(), 1);
        let code = String::from_utf8(out.find("index.js").unwrap().bytes.clone()).unwrap();
        assert!(code.starts_with("a();\n//# sourceMappingURL=data:application/json;charset=utf-8;base64,"));
    }

    #[test]
    fn test_hashes_follow_inline_source_map() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config(
            "entry = \"a.ts\"\ndevtool = \"inline-source-map\"\n[output]\nfilename = \"[name].[contenthash].[chunkhash].js\"\n",
            dir.path(),
        );
        // same emitted code, different original source
        let render_from = |original: &str| {
            let mut a = module("a.ts", ModuleKind::Script, "let a = 1;\n");
            a.map = Some(SourceMap::identity("a.ts", original));
            let out = render(&single_chunk(vec![a]), &[], &config).unwrap();
            let artifact = out.iter().next().unwrap();
            (artifact.file_name.clone(), artifact.bytes.clone())
        };

        let (name1, bytes1) = render_from("let a: number = 1;\n");
        let (name2, bytes2) = render_from("let a: string | number = 1;\n");
        let (name3, bytes3) = render_from("let a: number = 1;\n");
        assert_ne!(bytes1, bytes2);
        assert_ne!(name1, name2);
        assert_eq!(name1, name3);
        assert_eq!(bytes1, bytes3);

        let parts: Vec<_> = name1.split('.').collect();
        let parts2: Vec<_> = name2.split('.').collect();
        assert_ne!(parts[1], parts2[1]);
        assert_ne!(parts[2], parts2[2]);
    }

    #[test]
    fn test_external_source_map_file() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config(
            "entry = \"a.js\"\ndevtool = \"source-map\"\n[output]\nfilename = \"js/[name].js\"\n",
            dir.path(),
        );
        let mut a = module("a.js", ModuleKind::Script, "a();");
        a.map = Some(SourceMap::identity("a.js", "a();"));
        let out = render(&single_chunk(vec![a]), &[], &config).unwrap();
        let map = out.find("js/index.js.map").unwrap();
        assert_eq!(map.kind, ArtifactKind::SourceMap);
        let code = out.find("js/index.js").unwrap();
        assert!(code.bytes.ends_with(b"//# sourceMappingURL=index.js.map"));
        let value: serde_json::Value = serde_json::from_slice(&map.bytes).unwrap();
        assert_eq!(value["file"], "index.js");
    }

    #[test]
    fn test_name_collision_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.js\"\n[output]\nfilename = \"bundle.js\"\n", dir.path());
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("a.js", ModuleKind::Script, "a();"));
        let b = graph.add_module(module("b.js", ModuleKind::Script, "b();"));
        graph.chunks.push(Chunk::entry("one", vec![a], false));
        graph.chunks.push(Chunk::entry("two", vec![b], false));
        assert!(matches!(
            render(&graph, &[], &config),
            Err(RenderError::Collision { .. })
        ));
    }
}
