//! Build script for minifying the embedded module runtime.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

const RUNTIME_NS_PLACEHOLDER: &str = "__RAZORPACK_NS__";

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    minify_runtime_file("src/embed/runtime.js", &out_path.join("runtime.min.js"));

    println!("cargo:rerun-if-changed=src/embed/runtime.js");
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    // classic script: the runtime runs from a plain <script> tag
    let source_type = SourceType::cjs();

    let ret = Parser::new(&allocator, source, source_type).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

fn minify_runtime_file(input: &str, output: &Path) {
    let source = fs::read_to_string(input).expect("Failed to read runtime.js");
    let code = minify_js(&source);

    // the namespace is substituted at bundle time, so it must survive minification
    let count = code.matches(RUNTIME_NS_PLACEHOLDER).count();
    assert!(
        count >= 1,
        "minified runtime lost its {} placeholder",
        RUNTIME_NS_PLACEHOLDER
    );

    fs::write(output, code).expect("Failed to write minified runtime");
}
