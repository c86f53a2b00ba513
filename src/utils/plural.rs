//! Count-aware noun forms for log lines (`1 asset`, `3 entries`).

use std::borrow::Cow;

/// English plural of `noun` when `count != 1`.
///
/// Handles the regular suffixes only: `entry` → `entries`, `index` → `indexes`,
/// `chunk` → `chunks`.
pub fn plural(noun: &str, count: usize) -> Cow<'_, str> {
    if count == 1 {
        return Cow::Borrowed(noun);
    }
    let bytes = noun.as_bytes();
    let consonant_y = bytes.len() >= 2
        && bytes[bytes.len() - 1] == b'y'
        && !matches!(bytes[bytes.len() - 2], b'a' | b'e' | b'i' | b'o' | b'u');

    if consonant_y {
        Cow::Owned(format!("{}ies", &noun[..noun.len() - 1]))
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|end| noun.ends_with(end)) {
        Cow::Owned(format!("{noun}es"))
    } else {
        Cow::Owned(format!("{noun}s"))
    }
}

/// `"{count} {noun}"` with the noun inflected.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{count} {}", plural(noun, count))
}
