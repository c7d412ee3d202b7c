//! The ordered, deduplicated mapping of `doc_id` to document record.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::filename::disambiguate;

/// One discovered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Numeric identifier from the `docID` query parameter.
    pub doc_id: String,
    /// Absolute document URL.
    pub source_url: String,
    /// Destination filename, always ending in `.pdf`.
    pub filename: String,
}

impl DocumentRecord {
    /// Creates a record.
    pub fn new(
        doc_id: impl Into<String>,
        source_url: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            source_url: source_url.into(),
            filename: filename.into(),
        }
    }
}

/// Documents keyed by `doc_id`, iterated in insertion (discovery) order.
///
/// Keys are unique and the first insert for a key wins. Filenames are kept
/// unique as well (case-insensitively): a record whose filename is already
/// taken by another document is stored as `{stem}_{doc_id}.pdf`, or
/// `{stem}_{doc_id}_{n}.pdf` with the smallest free `n >= 2` when that name is
/// taken too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
    records: Vec<DocumentRecord>,
    positions: HashMap<String, usize>,
    filenames: HashSet<String>,
}

impl LinkIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` unless its `doc_id` is already present.
    ///
    /// Returns `true` when the record was added.
    pub fn insert(&mut self, mut record: DocumentRecord) -> bool {
        if self.positions.contains_key(&record.doc_id) {
            return false;
        }
        if self.filenames.contains(&record.filename.to_lowercase()) {
            record.filename = self.free_filename(&record.filename, &record.doc_id);
        }
        self.filenames.insert(record.filename.to_lowercase());
        self.positions
            .insert(record.doc_id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    fn free_filename(&self, filename: &str, doc_id: &str) -> String {
        let mut candidate = disambiguate(filename, doc_id);
        let mut counter = 2u32;
        while self.filenames.contains(&candidate.to_lowercase()) {
            candidate = disambiguate(filename, &format!("{doc_id}_{counter}"));
            counter += 1;
        }
        candidate
    }

    /// True when `doc_id` has been recorded.
    #[must_use]
    pub fn contains(&self, doc_id: &str) -> bool {
        self.positions.contains_key(doc_id)
    }

    /// Looks up a record by `doc_id`.
    #[must_use]
    pub fn get(&self, doc_id: &str) -> Option<&DocumentRecord> {
        self.positions.get(doc_id).map(|&pos| &self.records[pos])
    }

    /// Number of unique documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no documents were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, DocumentRecord> {
        self.records.iter()
    }

    /// Document identifiers in discovery order.
    #[must_use]
    pub fn doc_ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.doc_id.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a LinkIndex {
    type Item = &'a DocumentRecord;
    type IntoIter = std::slice::Iter<'a, DocumentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<DocumentRecord> for LinkIndex {
    fn from_iter<I: IntoIterator<Item = DocumentRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

impl Serialize for LinkIndex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LinkIndex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<DocumentRecord>::deserialize(deserializer)?;
        Ok(records.into_iter().collect())
    }
}
