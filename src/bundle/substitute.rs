//! Free-identifier substitution in script code.
//!
//! Matching is lexical: a name matches where it is not preceded by an
//! identifier character or `.`, and not followed by an identifier character.
//! Dotted names (`process.env.NODE_ENV`) match as a whole.

use std::borrow::Cow;

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Byte ranges of `name` occurrences that stand alone as an expression head.
fn occurrences<'a>(code: &'a str, name: &'a str) -> impl Iterator<Item = usize> + 'a {
    code.match_indices(name).filter_map(move |(start, _)| {
        let end = start + name.len();
        let before = code[..start].chars().next_back();
        let after = code[end..].chars().next();
        let head = before.is_none_or(|c| !is_ident_char(c) && c != '.');
        let tail = after.is_none_or(|c| !is_ident_char(c));
        (head && tail).then_some(start)
    })
}

/// Whether `code` references `name` as a free expression.
pub fn references(code: &str, name: &str) -> bool {
    !name.is_empty() && occurrences(code, name).next().is_some()
}

/// Replace every standalone occurrence of `name` with `value`.
pub fn replace_identifier<'a>(code: &'a str, name: &str, value: &str) -> Cow<'a, str> {
    if name.is_empty() {
        return Cow::Borrowed(code);
    }
    let mut out = String::new();
    let mut last = 0;
    for start in occurrences(code, name) {
        out.push_str(&code[last..start]);
        out.push_str(value);
        last = start + name.len();
    }
    if last == 0 {
        return Cow::Borrowed(code);
    }
    out.push_str(&code[last..]);
    Cow::Owned(out)
}

/// Compile-time constant table (`define`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    /// Longest names first so `a.b.c` is replaced before `a.b`.
    entries: Vec<(String, String)>,
}

impl Definitions {
    /// Later definitions of the same name override earlier ones.
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut table: Vec<(String, String)> = Vec::new();
        for (name, value) in entries {
            match table.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => table.push((name, value)),
            }
        }
        table.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { entries: table }
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, String)>) {
        let merged = std::mem::take(&mut self.entries).into_iter().chain(entries);
        *self = Self::new(merged);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Substitute all definitions; `None` when nothing matched.
    pub fn apply(&self, code: &str) -> Option<String> {
        let mut current: Option<String> = None;
        for (name, value) in &self.entries {
            let source = current.as_deref().unwrap_or(code);
            let replaced = match replace_identifier(source, name, value) {
                Cow::Owned(next) => Some(next),
                Cow::Borrowed(_) => None,
            };
            if replaced.is_some() {
                current = replaced;
            }
        }
        current
    }
}

/// A `provide` binding: free name → module key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideBinding {
    pub name: String,
    pub target: String,
}

impl ProvideBinding {
    /// Dotted bindings are replaced in place; plain names get a `var`.
    pub fn is_dotted(&self) -> bool {
        self.name.contains('.')
    }
}
