// src/models/collection.rs

//! Persisted question collection for one exam (`exam.json`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Record, RecordId, SyncStatus};

/// How a record was merged into a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted,
    Replaced,
}

/// Ordered question collection, indexed by question number for merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CollectionFile")]
pub struct Collection {
    pub status: SyncStatus,

    /// Last unrecovered error, empty when the last run succeeded
    pub error: String,

    #[serde(rename = "questions")]
    records: Vec<Record>,

    #[serde(skip)]
    index: HashMap<RecordId, usize>,
}

/// On-disk layout, indexed after loading.
#[derive(Deserialize)]
struct CollectionFile {
    #[serde(default)]
    status: SyncStatus,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    questions: Vec<Record>,
}

impl From<CollectionFile> for Collection {
    fn from(file: CollectionFile) -> Self {
        let mut collection = Collection {
            status: file.status,
            error: file.error.unwrap_or_default(),
            records: Vec::with_capacity(file.questions.len()),
            index: HashMap::with_capacity(file.questions.len()),
        };
        for record in file.questions {
            if collection.index.contains_key(&record.id) {
                log::warn!("Ignoring duplicate question {} in collection file", record.id);
                continue;
            }
            collection.upsert(record);
        }
        collection
    }
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from records, keeping the first of any duplicates.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        Self::from(CollectionFile {
            status: SyncStatus::InProgress,
            error: None,
            questions: records.into_iter().collect(),
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.status == SyncStatus::Complete
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    /// Insert a record, or replace the stored record with the same id in place.
    pub fn upsert(&mut self, record: Record) -> Merge {
        match self.index.get(&record.id) {
            Some(&pos) => {
                self.records[pos] = record;
                Merge::Replaced
            }
            None => {
                self.index.insert(record.id, self.records.len());
                self.records.push(record);
                Merge::Inserted
            }
        }
    }

    /// Order records by question number.
    pub fn sort_by_id(&mut self) {
        self.records.sort_by_key(|r| r.id);
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id, pos))
            .collect();
    }
}
