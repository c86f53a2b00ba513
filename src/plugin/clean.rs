//! `clean`: publish replaces the output directory instead of merging into it.

use super::{LifecyclePoint, Plugin};
use crate::config::CleanOptions;
use crate::pipeline::BuildContext;

pub struct Clean(pub CleanOptions);

impl Plugin for Clean {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::PreBuild]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> anyhow::Result<()> {
        ctx.publish.replace = true;
        ctx.publish.verbose = self.0.verbose;
        crate::debug!("clean"; "{} will be replaced on publish", ctx.config.output_dir().display());
        Ok(())
    }
}
