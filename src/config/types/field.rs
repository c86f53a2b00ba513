//! Config field paths used in diagnostics.

use owo_colors::OwoColorize;
use std::borrow::Cow;
use std::fmt;

/// Dotted path of a config field, e.g. `output.public_path` or
/// `module.rules[3].use`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Cow<'static, str>);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(Cow::Borrowed(path))
    }

    /// Path of a field inside an array element: `{array}[{index}].{field}`.
    pub fn indexed(array: &str, index: usize, field: &str) -> Self {
        if field.is_empty() {
            Self(Cow::Owned(format!("{array}[{index}]")))
        } else {
            Self(Cow::Owned(format!("{array}[{index}].{field}")))
        }
    }

    /// Path of a keyed entry: `{table}.{key}`.
    pub fn keyed(table: &str, key: &str) -> Self {
        Self(Cow::Owned(format!("{table}.{key}")))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_paths() {
        assert_eq!(FieldPath::new("devtool").as_str(), "devtool");
        assert_eq!(
            FieldPath::indexed("plugins", 2, "template").as_str(),
            "plugins[2].template"
        );
        assert_eq!(FieldPath::indexed("module.rules", 0, "").as_str(), "module.rules[0]");
        assert_eq!(FieldPath::keyed("entry", "vendor").as_str(), "entry.vendor");
    }
}
