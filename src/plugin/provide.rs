//! `provide`: free names bound to bundled modules.
//!
//! Targets are resolved and queued for bundling here; the graph attaches
//! them to the chunks whose scripts use the names, and rendering injects the
//! bindings.

use super::{LifecyclePoint, Plugin};
use crate::bundle::ProvideBinding;
use crate::config::ProvideOptions;
use crate::pipeline::BuildContext;
use crate::resolve::Resolver;
use anyhow::{Context, Result};

pub struct Provide(pub ProvideOptions);

impl Plugin for Provide {
    fn name(&self) -> &'static str {
        "provide"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::ResolveConfig]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let resolver = Resolver::new(ctx.config);
        for (name, request) in &self.0.bindings {
            let resolved = resolver
                .resolve(request)
                .with_context(|| format!("cannot provide `{name}`"))?;
            ctx.provides.push(ProvideBinding {
                name: name.clone(),
                target: resolved.key(),
            });
            ctx.add_request(resolved);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::core::CancelFlag;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_bindings_share_one_request() {
        let dir = TempDir::new().unwrap();
        let jquery = dir.path().join("node_modules/jquery");
        fs::create_dir_all(jquery.join("dist")).unwrap();
        fs::write(jquery.join("package.json"), r#"{ "main": "dist/jquery.js" }"#).unwrap();
        fs::write(jquery.join("dist/jquery.js"), "window.jQuery = {};").unwrap();

        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let mut ctx = BuildContext::new(&config, CancelFlag::new());
        let options = ProvideOptions {
            bindings: [("$", "jquery"), ("jQuery", "jquery")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        Provide(options).on(LifecyclePoint::ResolveConfig, &mut ctx).unwrap();

        assert_eq!(ctx.provides.len(), 2);
        assert!(ctx.provides.iter().all(|b| b.target == "node_modules/jquery/dist/jquery.js"));
        assert_eq!(ctx.extra_requests.len(), 1);
    }

    #[test]
    fn test_unresolvable_target_fails() {
        let dir = TempDir::new().unwrap();
        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let mut ctx = BuildContext::new(&config, CancelFlag::new());
        let options = ProvideOptions {
            bindings: [("$".to_string(), "jquery".to_string())].into_iter().collect(),
        };
        let err = Provide(options)
            .on(LifecyclePoint::ResolveConfig, &mut ctx)
            .unwrap_err();
        assert!(err.to_string().contains("`$`"));
    }
}
