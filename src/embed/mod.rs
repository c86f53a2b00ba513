//! Embedded static resources.
//!
//! [`MODULE_RUNTIME`] is `src/embed/runtime.js`, minified by `build.rs`. The
//! registry namespace is a placeholder filled in per build.

/// Placeholder for the registry namespace; must survive minification.
pub const NAMESPACE_PLACEHOLDER: &str = "__RAZORPACK_NS__";

/// Script source with one namespace placeholder.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSource(&'static str);

impl RuntimeSource {
    /// Runtime bound to the global property `namespace`.
    pub fn render(&self, namespace: &str) -> String {
        self.0.replace(NAMESPACE_PLACEHOLDER, namespace)
    }
}

/// Module runtime defining `require` over the shared registry.
pub const MODULE_RUNTIME: RuntimeSource =
    RuntimeSource(include_str!(concat!(env!("OUT_DIR"), "/runtime.min.js")));
