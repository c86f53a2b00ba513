//! `html`: generate the host page from a template.
//!
//! `<link>` tags for every chunk stylesheet go before `</head>`; `<script>`
//! tags go before `</body>` (or `</head>` with `inject = "head"`). Chunks are
//! injected in load order.

use super::{LifecyclePoint, Plugin};
use crate::bundle::{Artifact, ArtifactKind, OutputSet, public_url};
use crate::config::{HtmlOptions, Inject};
use crate::pipeline::BuildContext;
use anyhow::{Context, Result, bail};
use std::fs;

pub struct Html(pub HtmlOptions);

impl Plugin for Html {
    fn name(&self) -> &'static str {
        "html"
    }

    fn points(&self) -> &'static [LifecyclePoint] {
        &[LifecyclePoint::Emit]
    }

    fn on(&self, _point: LifecyclePoint, ctx: &mut BuildContext<'_>) -> Result<()> {
        let opts = &self.0;
        let template_path = ctx.config.root_join(&opts.template);
        let template = fs::read_to_string(&template_path)
            .with_context(|| format!("cannot read template `{}`", template_path.display()))?;

        let mut styles = String::new();
        let mut scripts = String::new();
        for idx in ctx.graph.load_order() {
            let chunk = &ctx.graph.chunks[idx].name;
            if !opts.chunks.is_empty() && !opts.chunks.contains(chunk) {
                continue;
            }
            collect_tags(&ctx.artifacts, chunk, &ctx.config.output.public_path, &mut styles, &mut scripts);
        }

        let page = inject(&template, &styles, &scripts, opts.inject);
        let file_name = opts.filename.to_string_lossy().replace('\\', "/");
        if ctx.artifacts.find(&file_name).is_some() {
            bail!("`{file_name}` is already an output file");
        }
        ctx.artifacts.push(Artifact {
            logical_name: file_name.clone(),
            file_name,
            kind: ArtifactKind::Generated,
            chunk: None,
            bytes: page.into_bytes(),
        });
        Ok(())
    }
}

fn collect_tags(
    artifacts: &OutputSet,
    chunk: &str,
    public_path: &str,
    styles: &mut String,
    scripts: &mut String,
) {
    for artifact in artifacts.chunk_artifacts(chunk) {
        let url = html_escape(&public_url(public_path, &artifact.file_name));
        match artifact.kind {
            ArtifactKind::Style => {
                styles.push_str(&format!(r#"<link href="{url}" rel="stylesheet">"#));
            }
            _ => {
                scripts.push_str(&format!(r#"<script type="text/javascript" src="{url}"></script>"#));
            }
        }
    }
}

/// Insert `styles` before `</head>` and `scripts` at the configured spot.
///
/// A missing closing tag means "append at the end".
fn inject(template: &str, styles: &str, scripts: &str, at: Inject) -> String {
    let lower = template.to_ascii_lowercase();
    let head = lower.find("</head>");
    let script_pos = match at {
        Inject::Body => lower.rfind("</body>"),
        Inject::Head => head,
    };

    let mut inserts = vec![
        (head.unwrap_or(template.len()), styles),
        (script_pos.unwrap_or(template.len()), scripts),
    ];
    // stable: at the same position styles come first
    inserts.sort_by_key(|(pos, _)| *pos);

    let mut out = String::with_capacity(template.len() + styles.len() + scripts.len());
    let mut last = 0;
    for (pos, text) in inserts {
        out.push_str(&template[last..pos]);
        out.push_str(text);
        last = pos;
    }
    out.push_str(&template[last..]);
    out
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Chunk;
    use crate::config::test_parse_config;
    use crate::core::CancelFlag;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const LAYOUT: &str = "<html>\n<head>\n<title>App</title>\n</head>\n<body>\n@RenderBody()\n</body>\n</html>\n";

    fn chunk_artifact(file_name: &str, kind: ArtifactKind, chunk: &str) -> Artifact {
        Artifact {
            file_name: file_name.into(),
            logical_name: file_name.into(),
            kind,
            chunk: Some(chunk.into()),
            bytes: Vec::new(),
        }
    }

    #[test]
    fn test_inject_positions() {
        let page = inject(LAYOUT, "<S>", "<J>", Inject::Body);
        assert_eq!(
            page,
            "<html>\n<head>\n<title>App</title>\n<S></head>\n<body>\n@RenderBody()\n<J></body>\n</html>\n"
        );

        let page = inject(LAYOUT, "<S>", "<J>", Inject::Head);
        assert!(page.contains("<S><J></head>"));

        assert_eq!(inject("plain", "<S>", "<J>", Inject::Body), "plain<S><J>");
    }

    #[test]
    fn test_generates_page_in_load_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("layout.html"), LAYOUT).unwrap();
        let config = test_parse_config(
            "entry = \"a.js\"\n[output]\npublic_path = \"/dist/\"\n",
            dir.path(),
        );
        let mut ctx = BuildContext::new(&config, CancelFlag::new());

        ctx.graph.chunks.push(Chunk::entry("index", Vec::new(), false));
        let mut vendor = Chunk::entry("vendor", Vec::new(), false);
        vendor.commons = true;
        ctx.graph.chunks.push(vendor);

        ctx.artifacts.push(chunk_artifact("index.css", ArtifactKind::Style, "index"));
        ctx.artifacts.push(chunk_artifact("index.js", ArtifactKind::Script, "index"));
        ctx.artifacts.push(chunk_artifact("index.js.map", ArtifactKind::SourceMap, "index"));
        ctx.artifacts.push(chunk_artifact("vendor.js", ArtifactKind::Script, "vendor"));

        let plugin = Html(HtmlOptions {
            template: PathBuf::from("layout.html"),
            filename: PathBuf::from("../Views/_Layout.cshtml"),
            inject: Inject::Body,
            chunks: Vec::new(),
        });
        plugin.on(LifecyclePoint::Emit, &mut ctx).unwrap();

        let page = ctx.artifacts.find("../Views/_Layout.cshtml").unwrap();
        let page = String::from_utf8(page.bytes.clone()).unwrap();
        assert!(page.contains(r#"<link href="/dist/index.css" rel="stylesheet"></head>"#));
        assert!(page.contains(concat!(
            r#"<script type="text/javascript" src="/dist/vendor.js"></script>"#,
            r#"<script type="text/javascript" src="/dist/index.js"></script>"#,
            "</body>"
        )));
        assert!(!page.contains(".map"));

        // a second run would overwrite its own output
        assert!(plugin.on(LifecyclePoint::Emit, &mut ctx).is_err());
    }

    #[test]
    fn test_chunk_filter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("layout.html"), LAYOUT).unwrap();
        let config = test_parse_config("entry = \"a.js\"\n", dir.path());
        let mut ctx = BuildContext::new(&config, CancelFlag::new());
        ctx.graph.chunks.push(Chunk::entry("index", Vec::new(), false));
        ctx.graph.chunks.push(Chunk::entry("admin", Vec::new(), false));
        ctx.artifacts.push(chunk_artifact("index.js", ArtifactKind::Script, "index"));
        ctx.artifacts.push(chunk_artifact("admin.js", ArtifactKind::Script, "admin"));

        Html(HtmlOptions {
            template: PathBuf::from("layout.html"),
            filename: PathBuf::from("index.html"),
            inject: Inject::Body,
            chunks: vec!["admin".into()],
        })
        .on(LifecyclePoint::Emit, &mut ctx)
        .unwrap();

        let page = String::from_utf8(ctx.artifacts.find("index.html").unwrap().bytes.clone()).unwrap();
        assert!(page.contains("/admin.js"));
        assert!(!page.contains("/index.js"));
    }
}
