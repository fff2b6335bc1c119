//! Format adapter contract.
//!
//! The engine hands a [`PersistedMapping`] to a [`FormatAdapter`] on save and
//! gets one back on load. It never looks at the bytes itself.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::value::Value;

/// Ordered member name to value mapping, with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedMapping {
    entries: Vec<(String, Value)>,
}

impl PersistedMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing the value in place if the name exists.
    ///
    /// Returns the replaced value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for PersistedMapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for PersistedMapping {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (name, value) in iter {
            mapping.insert(name, value);
        }
        mapping
    }
}

/// Encodes and decodes a [`PersistedMapping`].
///
/// Implementations must keep each entry's name and enough of its type tag to
/// rebuild the original [`Value`] variant on decode.
pub trait FormatAdapter: Send + Sync {
    /// Format name for logs and errors.
    fn name(&self) -> &'static str;

    /// Write the mapping to `writer`.
    fn encode(&self, mapping: &PersistedMapping, writer: &mut dyn Write) -> Result<()>;

    /// Read a mapping from `reader`.
    ///
    /// Returns `Ok(None)` when the stream holds no document at all.
    fn decode(&self, reader: &mut dyn Read) -> Result<Option<PersistedMapping>>;

    /// Turn a configured path into the path actually used on disk.
    fn realize_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}
