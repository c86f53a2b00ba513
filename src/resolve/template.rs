//! Output filename templates.
//!
//! Tokens: `[name]`, `[ext]`, `[hash]`, `[contenthash]`, `[chunkhash]`. Hash
//! tokens accept a length limit (`[chunkhash:8]`). Bracketed text that is not
//! a token is copied through unchanged.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use thiserror::Error;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(name|ext|hash|contenthash|chunkhash)(?::([0-9]+))?\]").unwrap()
});

/// Values available to one template expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokens<'a> {
    pub name: Option<&'a str>,
    pub ext: Option<&'a str>,
    /// Hash of the artifact's own bytes (`[hash]`, `[contenthash]`).
    pub content_hash: Option<&'a str>,
    /// Hash of the chunk's module set (`[chunkhash]`).
    pub chunk_hash: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("`[{token}]` has no value in template `{template}`")]
    Missing { token: String, template: String },

    #[error("`[{token}:0]` in template `{template}` yields an empty hash")]
    ZeroLength { token: String, template: String },
}

/// Substitute all tokens in `template`.
pub fn resolve_output_path(template: &str, tokens: &Tokens<'_>) -> Result<String, TemplateError> {
    let mut error = None;
    let out = TOKEN.replace_all(template, |caps: &Captures<'_>| {
        match expand(caps, tokens, template) {
            Ok(value) => value,
            Err(e) => {
                error.get_or_insert(e);
                String::new()
            }
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(out.into_owned()),
    }
}

fn expand(caps: &Captures<'_>, tokens: &Tokens<'_>, template: &str) -> Result<String, TemplateError> {
    let token = &caps[1];
    let value = match token {
        "name" => tokens.name,
        "ext" => tokens.ext,
        "hash" | "contenthash" => tokens.content_hash,
        "chunkhash" => tokens.chunk_hash,
        _ => None,
    }
    .ok_or_else(|| TemplateError::Missing {
        token: token.to_string(),
        template: template.to_string(),
    })?;

    match caps.get(2).map(|m| m.as_str().parse::<usize>()) {
        None => Ok(value.to_string()),
        Some(Ok(0)) => Err(TemplateError::ZeroLength {
            token: token.to_string(),
            template: template.to_string(),
        }),
        // over-long digit runs just mean "everything"
        Some(Ok(len)) => Ok(value.chars().take(len).collect()),
        Some(Err(_)) => Ok(value.to_string()),
    }
}
