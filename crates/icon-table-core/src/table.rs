use crate::error::{IconTableError, Result};
use crate::model::{BuildStats, EncodedImage, EncodingKind, ImageRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Name-keyed collection of records, ordered by name so emitted artifacts are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ImageTable {
    records: BTreeMap<String, ImageRecord>,
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `encoded` and inserts it under `name`.
    pub fn insert(&mut self, name: impl Into<String>, encoded: EncodedImage) -> Result<&ImageRecord> {
        self.insert_record(ImageRecord::from_encoded(name, encoded))
    }

    /// Inserts a finished record. Names must be unique across the table.
    pub fn insert_record(&mut self, record: ImageRecord) -> Result<&ImageRecord> {
        match self.records.entry(record.name.clone()) {
            Entry::Occupied(e) => Err(IconTableError::DuplicateName(e.key().clone())),
            Entry::Vacant(v) => Ok(v.insert(record)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ImageRecord> {
        self.records.get(name)
    }

    /// Like [`get`](Self::get) but a miss is an error.
    pub fn lookup(&self, name: &str) -> Result<&ImageRecord> {
        self.records
            .get(name)
            .ok_or_else(|| IconTableError::UnknownImage(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.values()
    }

    /// Computes storage statistics for this table.
    pub fn stats(&self) -> BuildStats {
        let mut stats = BuildStats::default();
        for rec in self.records.values() {
            stats.num_images += 1;
            match rec.kind() {
                EncodingKind::RawContainer => stats.num_raw_container += 1,
                EncodingKind::AlphaRle => stats.num_alpha_rle += 1,
                EncodingKind::FullRle => stats.num_full_rle += 1,
            }
            stats.decoded_bytes += rec.rgba_len() as u64;
            stats.stored_bytes += rec.size as u64;
            stats.max_record_size = stats.max_record_size.max(rec.size);
        }
        stats
    }
}

impl<'a> IntoIterator for &'a ImageTable {
    type Item = &'a ImageRecord;
    type IntoIter = std::collections::btree_map::Values<'a, String, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}
