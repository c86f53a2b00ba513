//! `[entry]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [entry]
//! index = "src/index.ts"
//! vendor = ["jquery", "jquery-validation", "bootstrap"]
//! ```
//!
//! A bare string (`entry = "src/index.ts"`) or list is a single entry named
//! `main`. Entry order follows the document.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Name used for an entry given as a bare string or list.
pub const DEFAULT_ENTRY_NAME: &str = "main";

/// Requests of a single entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryRequest {
    Single(String),
    Many(Vec<String>),
}

impl EntryRequest {
    pub fn requests(&self) -> &[String] {
        match self {
            Self::Single(request) => std::slice::from_ref(request),
            Self::Many(requests) => requests,
        }
    }
}

/// Ordered `(name, requests)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entries(Vec<(String, EntryRequest)>);

impl Entries {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntryRequest)> {
        self.0.iter().map(|(name, request)| (name.as_str(), request))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&EntryRequest> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }
}

impl FromIterator<(String, EntryRequest)> for Entries {
    fn from_iter<I: IntoIterator<Item = (String, EntryRequest)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a path, a list of paths, or a table of named entries")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Entries, E> {
                Ok(Entries(vec![(
                    DEFAULT_ENTRY_NAME.to_string(),
                    EntryRequest::Single(value.to_string()),
                )]))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Entries, A::Error> {
                let mut requests = Vec::new();
                while let Some(request) = seq.next_element::<String>()? {
                    requests.push(request);
                }
                Ok(Entries(vec![(
                    DEFAULT_ENTRY_NAME.to_string(),
                    EntryRequest::Many(requests),
                )]))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Entries, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, request)) = map.next_entry::<String, EntryRequest>()? {
                    entries.push((name, request));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_any(EntriesVisitor)
    }
}

impl Serialize for Entries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, request) in &self.0 {
            map.serialize_entry(name, request)?;
        }
        map.end()
    }
}
