use std::collections::HashMap;

/// Text recorded for an entry the model never produced a translation for.
pub const EMPTY_SENTINEL: &str = "[EMPTY]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub key: String,

    /// `[primary text, hint, ...]` as stored after the key.
    pub fields: Vec<String>,
}

impl ResourceEntry {
    pub fn new(key: impl Into<String>, fields: Vec<String>) -> Self {
        ResourceEntry {
            key: key.into(),
            fields,
        }
    }

    pub fn text(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    /// Disambiguation hint, if the second field is present and not blank.
    pub fn hint(&self) -> Option<&str> {
        self.fields
            .get(1)
            .map(String::as_str)
            .filter(|h| !h.trim().is_empty())
    }
}

/// Entries in file order. Keys are unique; the first occurrence of a key wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    entries: Vec<ResourceEntry>,
    index: HashMap<String, usize>,
}

impl ResourceFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and leaves the file untouched when the key is already present.
    pub fn insert(&mut self, entry: ResourceEntry) -> bool {
        if self.index.contains_key(&entry.key) {
            return false;
        }
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn get(&self, key: &str) -> Option<&ResourceEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ResourceFile {
    type Item = &'a ResourceEntry;
    type IntoIter = std::slice::Iter<'a, ResourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
