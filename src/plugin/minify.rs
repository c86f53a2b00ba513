//! `minify`: minify script and style modules after chunking.

use super::{LifecyclePoint, Plugin};
use crate::config::MinifyOptions;
use crate::core::ModuleKind;
use crate::pipeline::BuildContext;
use crate::stage::minify::{minify_css, minify_js};
use anyhow::Result;

pub struct Minify(pub MinifyOptions);

impl Plugin for Minify {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::Optimize]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let opts = &self.0;
        for module in ctx.graph.modules_mut() {
            let result = match module.kind {
                ModuleKind::Script if opts.scripts && !module.is_external() => {
                    minify_js(&module.text(), opts.mangle)
                }
                ModuleKind::Style if opts.styles => minify_css(&module.text()),
                _ => continue,
            };
            match result {
                Ok(code) => module.set_code(code),
                // keep the module as is
                Err(e) => crate::debug!("minify"; "skipped {}: {}", module.key, e),
            }
        }
        Ok(())
    }
}
