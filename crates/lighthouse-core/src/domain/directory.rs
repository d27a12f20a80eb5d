//! Recursive resource listings, the payload of a `LIST` response.
//!
//! A [`DirectoryTree`] maps entry names to [`Entry`] values.  A leaf resource
//! is represented as `null` and a sub-directory as a nested map:
//!
//! ```json
//! {"user": {"alice": {"model": null}}, "readme": null}
//! ```
//!
//! The same shape is used in JSON (via serde) and on the MessagePack wire
//! (see [`crate::protocol::payload`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An entry in a directory: either a leaf resource or a nested directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entry {
    Resource,
    Directory(DirectoryTree),
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Entry::Resource => serializer.serialize_none(),
            Entry::Directory(tree) => tree.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<DirectoryTree>::deserialize(deserializer)? {
            None => Entry::Resource,
            Some(tree) => Entry::Directory(tree),
        })
    }
}

impl From<DirectoryTree> for Entry {
    fn from(tree: DirectoryTree) -> Self {
        Entry::Directory(tree)
    }
}

/// A filesystem-like listing: name → [`Entry`].
///
/// Entries are kept in a `BTreeMap` so iteration and `Debug` output are
/// sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryTree {
    entries: BTreeMap<String, Entry>,
}

impl DirectoryTree {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of entries directly in this directory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accesses the child entry with the given name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Inserts or replaces a child entry, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(name.into(), entry)
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, entry: impl Into<Entry>) -> Self {
        self.insert(name, entry.into());
        self
    }

    /// Iterates over the entries sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    /// Walks `path` segment by segment and returns the entry at its end.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Entry> {
        let (last, parents) = path.split_last()?;
        let mut dir = self;
        for segment in parents {
            match dir.get(segment.as_ref())? {
                Entry::Directory(child) => dir = child,
                Entry::Resource => return None,
            }
        }
        dir.get(last.as_ref())
    }
}

impl FromIterator<(String, Entry)> for DirectoryTree {
    fn from_iter<I: IntoIterator<Item = (String, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DirectoryTree {
    type Item = (&'a String, &'a Entry);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for DirectoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, entry)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match entry {
                Entry::Resource => write!(f, "{name:?}: .resource")?,
                Entry::Directory(tree) => write!(f, "{name:?}: {tree}")?,
            }
        }
        f.write_str("}")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
