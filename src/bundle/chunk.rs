//! Chunks and the module graph they index into.

use super::module::Module;
use super::substitute::{ProvideBinding, references};
use crate::core::ModuleKind;
use crate::resolve::ResolvedEntry;
use crate::utils::hash::{CompositeHasher, ContentHash};
use rustc_hash::FxHashMap;

pub type ModuleIdx = usize;

/// Modules rendered into one set of artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub name: String,
    /// Modules whose code lives in this chunk, in order.
    pub modules: Vec<ModuleIdx>,
    /// Modules executed when the chunk loads (`modules` format).
    pub entry_modules: Vec<ModuleIdx>,
    /// Whether the chunk carries a copy of the module runtime.
    pub has_runtime: bool,
    /// Shared modules split out of entry chunks; never binds the library.
    pub commons: bool,
}

impl Chunk {
    pub fn entry(name: impl Into<String>, modules: Vec<ModuleIdx>, has_runtime: bool) -> Self {
        Self {
            name: name.into(),
            entry_modules: modules.clone(),
            modules,
            has_runtime,
            commons: false,
        }
    }

    /// Chunk holding nothing but the runtime.
    pub fn runtime(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
            entry_modules: Vec::new(),
            has_runtime: true,
            commons: false,
        }
    }

    pub fn is_runtime_only(&self) -> bool {
        self.has_runtime && self.modules.is_empty() && self.entry_modules.is_empty()
    }

    pub fn contains(&self, idx: ModuleIdx) -> bool {
        self.modules.contains(&idx)
    }

    /// Load order rank: runtime, then commons, then entries.
    pub fn load_rank(&self) -> u8 {
        if self.is_runtime_only() {
            0
        } else if self.commons {
            1
        } else {
            2
        }
    }
}

/// All modules of a build plus the chunks referencing them.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    by_key: FxHashMap<String, ModuleIdx>,
    pub chunks: Vec<Chunk>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module (deduplicated by key). Ids are assigned in insertion order.
    pub fn add_module(&mut self, mut module: Module) -> ModuleIdx {
        if let Some(&idx) = self.by_key.get(&module.key) {
            return idx;
        }
        let idx = self.modules.len();
        if module.id.is_empty() {
            module.id = idx.to_string();
        }
        self.by_key.insert(module.key.clone(), idx);
        self.modules.push(module);
        idx
    }

    /// Build the graph: modules in the given order, one chunk per entry.
    ///
    /// Entry requests whose module is missing from `modules` are skipped.
    pub fn from_entries(entries: &[ResolvedEntry], modules: Vec<Module>, with_runtime: bool) -> Self {
        let mut graph = Self::new();
        for module in modules {
            graph.add_module(module);
        }
        for entry in entries {
            let mut members = Vec::new();
            for request in &entry.requests {
                if let Some(idx) = graph.index_of(&request.key()) {
                    if !members.contains(&idx) {
                        members.push(idx);
                    }
                }
            }
            graph.chunks.push(Chunk::entry(&entry.name, members, with_runtime));
        }
        graph
    }

    pub fn index_of(&self, key: &str) -> Option<ModuleIdx> {
        self.by_key.get(key).copied()
    }

    pub fn module(&self, idx: ModuleIdx) -> &Module {
        &self.modules[idx]
    }

    pub fn module_mut(&mut self, idx: ModuleIdx) -> &mut Module {
        &mut self.modules[idx]
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn modules_mut(&mut self) -> &mut [Module] {
        &mut self.modules
    }

    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// Modules referenced by at least one chunk, in graph order.
    pub fn used_modules(&self) -> impl Iterator<Item = (ModuleIdx, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.chunks.iter().any(|c| c.contains(*idx)))
    }

    /// Chunk indices in load order (runtime, commons, entries; stable).
    pub fn load_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.chunks.len()).collect();
        order.sort_by_key(|&i| self.chunks[i].load_rank());
        order
    }

    /// Add each provided module to the chunks whose scripts use its name.
    pub fn attach_provided(&mut self, bindings: &[ProvideBinding]) {
        for binding in bindings {
            let Some(target) = self.index_of(&binding.target) else {
                continue;
            };
            for chunk in &mut self.chunks {
                if chunk.contains(target) {
                    continue;
                }
                let uses = chunk.modules.iter().any(|&idx| {
                    let module = &self.modules[idx];
                    idx != target
                        && module.kind == ModuleKind::Script
                        && references(&module.text(), &binding.name)
                });
                if uses {
                    chunk.modules.insert(0, target);
                }
            }
        }
    }

    /// Hash of the chunk's name, runtime flag and module set (ids + contents).
    pub fn chunk_hash(&self, chunk: &Chunk) -> ContentHash {
        let mut members: Vec<(&str, String)> = chunk
            .modules
            .iter()
            .map(|&idx| {
                let module = &self.modules[idx];
                (module.id.as_str(), module.content_hash().to_hex())
            })
            .collect();
        members.sort();

        let mut hasher = CompositeHasher::new();
        hasher.field(&chunk.name);
        hasher.field([u8::from(chunk.has_runtime)]);
        for (id, hash) in members {
            hasher.field(id).field(hash);
        }
        for &idx in &chunk.entry_modules {
            hasher.field("entry").field(&self.modules[idx].id);
        }
        hasher.finish()
    }
}
