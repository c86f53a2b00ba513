//! `hashed-module-ids`: module ids derived from root-relative paths.
//!
//! Sequential ids shift whenever a module is added; hashed ids keep
//! unrelated chunk hashes stable across such changes.

use super::{LifecyclePoint, Plugin};
use crate::config::HashedModuleIdsOptions;
use crate::pipeline::BuildContext;
use crate::utils::hash::ContentHash;
use anyhow::Result;
use rustc_hash::FxHashSet;

pub struct HashedModuleIds(pub HashedModuleIdsOptions);

impl Plugin for HashedModuleIds {
    fn name(&self) -> &'static str {
        "hashed-module-ids"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::Optimize]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let mut taken = FxHashSet::default();
        for module in ctx.graph.modules_mut() {
            module.id = hashed_id(&module.key, self.0.length, &mut taken);
        }
        Ok(())
    }
}

/// Shortest prefix (at least `len` digits) of the key's hash not yet taken.
fn hashed_id(key: &str, len: usize, taken: &mut FxHashSet<String>) -> String {
    let hex = ContentHash::of(key.as_bytes()).to_hex();
    let mut len = len.clamp(1, hex.len());
    loop {
        let id = &hex[..len];
        if len == hex.len() || !taken.contains(id) {
            taken.insert(id.to_string());
            return id.to_string();
        }
        len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_prefixes() {
        let mut taken = FxHashSet::default();
        let id = hashed_id("src/index.ts", 4, &mut taken);
        assert_eq!(id.len(), 4);
        assert!(ContentHash::of(b"src/index.ts").to_hex().starts_with(&id));

        let mut fresh = FxHashSet::default();
        assert_eq!(hashed_id("src/index.ts", 4, &mut fresh), id);
    }

    #[test]
    fn test_collisions_extend_the_prefix() {
        let mut taken = FxHashSet::default();
        let hex = ContentHash::of(b"src/a.js").to_hex();
        taken.insert(hex[..4].to_string());
        let id = hashed_id("src/a.js", 4, &mut taken);
        assert_eq!(id, &hex[..5]);
    }
}
