use std::collections::btree_map::{self, BTreeMap};

use crate::dataset::Dataset;

/// Result datasets keyed by the reference (or variable) they were computed for.
///
/// Operations that may fan out over several references always return this mapping, even when
/// only one entry is present. Use `single` for the common one-reference case.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Results {
    entries: BTreeMap<String, Dataset>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, key: S, dataset: Dataset) {
        self.entries.insert(key.into(), dataset);
    }

    pub fn get(&self, key: &str) -> Option<&Dataset> {
        self.entries.get(key)
    }

    /// The only entry, if there is exactly one.
    pub fn single(&self) -> Option<&Dataset> {
        match self.entries.len() {
            1 => self.entries.values().next(),
            _ => None,
        }
    }

    pub fn into_single(mut self) -> Option<Dataset> {
        match self.entries.len() {
            1 => self.entries.pop_first().map(|(_, dataset)| dataset),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Dataset> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Dataset> {
        self.entries
    }
}

impl FromIterator<(String, Dataset)> for Results {
    fn from_iter<T: IntoIterator<Item = (String, Dataset)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Results {
    type Item = (String, Dataset);
    type IntoIter = btree_map::IntoIter<String, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Results {
    type Item = (&'a String, &'a Dataset);
    type IntoIter = btree_map::Iter<'a, String, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
