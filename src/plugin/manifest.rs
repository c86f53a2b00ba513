//! `manifest`: JSON map from logical artifact names to public URLs.

use super::{LifecyclePoint, Plugin};
use crate::bundle::{Artifact, ArtifactKind, public_url};
use crate::config::ManifestOptions;
use crate::pipeline::BuildContext;
use anyhow::{Result, bail};
use serde_json::{Map, Value};

pub struct Manifest(pub ManifestOptions);

impl Plugin for Manifest {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::Emit]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let public_path = &ctx.config.output.public_path;
        let mut map = Map::new();
        for artifact in ctx.artifacts.iter() {
            if matches!(artifact.kind, ArtifactKind::Generated) {
                continue;
            }
            map.insert(
                artifact.logical_name.clone(),
                Value::String(public_url(public_path, &artifact.file_name)),
            );
        }

        let file_name = self.0.filename.clone();
        if ctx.artifacts.find(&file_name).is_some() {
            bail!("`{file_name}` is already an output file");
        }
        let mut bytes = serde_json::to_vec_pretty(&Value::Object(map))?;
        bytes.push(b'\n');
        ctx.artifacts.push(Artifact {
            logical_name: file_name.clone(),
            file_name,
            kind: ArtifactKind::Generated,
            chunk: None,
            bytes,
        });
        Ok(())
    }
}
