//! `runtime-chunk`: one shared copy of the module runtime in its own chunk.

use super::{LifecyclePoint, Plugin};
use crate::bundle::Chunk;
use crate::config::RuntimeChunkOptions;
use crate::pipeline::BuildContext;
use anyhow::{Result, bail};

pub struct RuntimeChunk(pub RuntimeChunkOptions);

impl Plugin for RuntimeChunk {
    fn name(&self) -> &'static str {
        "runtime-chunk"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::Optimize]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let name = &self.0.chunk;
        if ctx.graph.chunk(name).is_some() {
            bail!("a chunk named `{name}` already exists");
        }
        for chunk in &mut ctx.graph.chunks {
            chunk.has_runtime = false;
        }
        ctx.graph.chunks.push(Chunk::runtime(name.as_str()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::core::CancelFlag;
    use tempfile::TempDir;

    #[test]
    fn test_runtime_moves_to_own_chunk() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let mut ctx = BuildContext::new(&config, CancelFlag::new());
        ctx.graph.chunks.push(Chunk::entry("index", Vec::new(), true));
        ctx.graph.chunks.push(Chunk::entry("admin", Vec::new(), true));

        let plugin = RuntimeChunk(RuntimeChunkOptions::default());
        plugin.on(LifecyclePoint::Optimize, &mut ctx).unwrap();

        let runtime = ctx.graph.chunk("runtime").unwrap();
        assert!(runtime.is_runtime_only());
        assert_eq!(ctx.graph.chunks.iter().filter(|c| c.has_runtime).count(), 1);
        assert_eq!(ctx.graph.load_order()[0], 2);

        let err = plugin.on(LifecyclePoint::Optimize, &mut ctx).unwrap_err();
        assert!(err.to_string().contains("`runtime`"));
    }
}
