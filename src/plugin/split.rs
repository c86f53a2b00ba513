//! `split-chunks`: move shared modules into a commons chunk.
//!
//! With an existing chunk of the configured name (a `vendor` entry), that
//! chunk becomes the commons chunk and its modules leave every other chunk.
//! Otherwise modules present in at least `min_chunks` entry chunks move into
//! a new chunk of that name.

use super::{LifecyclePoint, Plugin};
use crate::bundle::{Chunk, ModuleGraph, ModuleIdx};
use crate::config::SplitChunksOptions;
use crate::pipeline::BuildContext;
use crate::utils::plural_count;
use anyhow::Result;

pub struct SplitChunks(pub SplitChunksOptions);

impl Plugin for SplitChunks {
    fn name(&self) -> &'static str {
        "split-chunks"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::Optimize]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let graph = &mut ctx.graph;
        let name = self.0.chunk.as_str();

        match graph.chunks.iter().position(|c| c.name == name) {
            Some(pos) => promote(graph, pos),
            None => {
                let entries = graph.chunks.iter().filter(|c| is_entry(c)).count();
                let min = self.0.min_chunks.unwrap_or_else(|| entries.max(2));
                let moved = extract(graph, name, min);
                crate::debug!("split"; "{} moved into `{}`", plural_count(moved, "module"), name);
            }
        }
        Ok(())
    }
}

fn is_entry(chunk: &Chunk) -> bool {
    !chunk.commons && !chunk.is_runtime_only()
}

/// Make chunk `pos` the commons chunk; its modules leave all other chunks.
fn promote(graph: &mut ModuleGraph, pos: usize) {
    graph.chunks[pos].commons = true;
    let shared = graph.chunks[pos].modules.clone();
    for (i, chunk) in graph.chunks.iter_mut().enumerate() {
        if i != pos {
            chunk.modules.retain(|idx| !shared.contains(idx));
        }
    }
}

/// Move modules shared by `min` entry chunks into a new chunk `name`.
fn extract(graph: &mut ModuleGraph, name: &str, min: usize) -> usize {
    let mut counts: Vec<(ModuleIdx, usize)> = Vec::new();
    for chunk in graph.chunks.iter().filter(|c| is_entry(c)) {
        for &idx in &chunk.modules {
            match counts.iter_mut().find(|(i, _)| *i == idx) {
                Some(slot) => slot.1 += 1,
                None => counts.push((idx, 1)),
            }
        }
    }

    let mut shared: Vec<ModuleIdx> = counts
        .into_iter()
        .filter(|&(_, count)| count >= min)
        .map(|(idx, _)| idx)
        .collect();
    if shared.is_empty() {
        return 0;
    }
    shared.sort_unstable();

    for chunk in graph.chunks.iter_mut().filter(|c| is_entry(c)) {
        chunk.modules.retain(|idx| !shared.contains(idx));
    }
    let moved = shared.len();
    graph.chunks.push(Chunk {
        name: name.to_string(),
        modules: shared,
        entry_modules: Vec::new(),
        has_runtime: false,
        commons: true,
    });
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Module, ModuleSource};
    use crate::config::test_parse_config;
    use crate::core::{CancelFlag, ModuleKind};
    use tempfile::TempDir;

    fn graph(chunks: &[(&str, &[&str])]) -> ModuleGraph {
        let mut graph = ModuleGraph::new();
        for (name, keys) in chunks {
            let members = keys
                .iter()
                .map(|key| {
                    graph.add_module(Module::new(
                        *key,
                        ModuleKind::Script,
                        ModuleSource::File(key.into()),
                        key.as_bytes().to_vec(),
                    ))
                })
                .collect();
            graph.chunks.push(Chunk::entry(*name, members, false));
        }
        graph
    }

    fn keys(graph: &ModuleGraph, chunk: &str) -> Vec<String> {
        graph
            .chunk(chunk)
            .unwrap()
            .modules
            .iter()
            .map(|&idx| graph.module(idx).key.clone())
            .collect()
    }

    fn run(graph: ModuleGraph, options: SplitChunksOptions) -> ModuleGraph {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let mut ctx = BuildContext::new(&config, CancelFlag::new());
        ctx.graph = graph;
        SplitChunks(options).on(LifecyclePoint::Optimize, &mut ctx).unwrap();
        ctx.graph
    }

    #[test]
    fn test_named_vendor_chunk_is_promoted() {
        let graph = graph(&[
            ("vendor", &["jquery.js", "bootstrap.js"]),
            ("index", &["jquery.js", "index.js"]),
        ]);
        let graph = run(
            graph,
            SplitChunksOptions {
                chunk: "vendor".into(),
                min_chunks: None,
            },
        );
        assert!(graph.chunk("vendor").unwrap().commons);
        assert_eq!(keys(&graph, "index"), ["index.js"]);
        assert_eq!(keys(&graph, "vendor"), ["jquery.js", "bootstrap.js"]);
        assert_eq!(graph.load_order(), [0, 1]);
    }

    #[test]
    fn test_shared_modules_extracted() {
        let graph = graph(&[
            ("index", &["shared.js", "a.js"]),
            ("admin", &["b.js", "shared.js"]),
            ("login", &["c.js"]),
        ]);
        let graph = run(
            graph,
            SplitChunksOptions {
                chunk: "commons".into(),
                min_chunks: Some(2),
            },
        );
        assert_eq!(keys(&graph, "commons"), ["shared.js"]);
        assert_eq!(keys(&graph, "index"), ["a.js"]);
        assert_eq!(keys(&graph, "admin"), ["b.js"]);
        assert_eq!(graph.load_order()[0], 3);
    }

    #[test]
    fn test_nothing_shared_adds_no_chunk() {
        let graph = graph(&[("index", &["a.js"]), ("admin", &["b.js"])]);
        let graph = run(
            graph,
            SplitChunksOptions {
                chunk: "commons".into(),
                min_chunks: None,
            },
        );
        assert!(graph.chunk("commons").is_none());
    }
}
