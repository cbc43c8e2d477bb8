// src/pipeline/validate.rs

//! Offline consistency check of the data directory.

use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::models::{ChunkMetadata, SyncStatus};
use crate::storage::CollectionStorage;

/// One inconsistency found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Collection code, `None` for store-wide files
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => write!(f, "manifest: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreReport {
    pub collections: usize,
    pub issues: Vec<Issue>,
}

impl StoreReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn collection_issue(&mut self, code: &str, message: impl Into<String>) {
        self.issues.push(Issue {
            code: Some(code.to_string()),
            message: message.into(),
        });
    }

    fn manifest_issue(&mut self, message: impl Into<String>) {
        self.issues.push(Issue {
            code: None,
            message: message.into(),
        });
    }
}

/// Check every collection, its chunks and the manifest.
pub async fn validate_store(storage: &dyn CollectionStorage) -> Result<StoreReport> {
    let codes = storage.list_collections().await?;
    let mut report = StoreReport {
        collections: codes.len(),
        ..StoreReport::default()
    };
    let mut counts = HashMap::new();

    for code in &codes {
        let collection = match storage.load_collection(code).await {
            Ok(Some(collection)) => collection,
            Ok(None) => continue,
            Err(e) => {
                report.collection_issue(code, format!("unreadable exam.json: {e}"));
                continue;
            }
        };
        counts.insert(code.clone(), collection.len());

        if collection.status != SyncStatus::Complete {
            let mut message = format!("status is '{}'", collection.status);
            if !collection.error.is_empty() {
                message.push_str(&format!(" ({})", collection.error));
            }
            report.collection_issue(code, message);
        }

        match storage.load_chunk_metadata(code).await {
            Ok(Some(metadata)) => {
                check_chunks(storage, code, &metadata, collection.len(), &mut report).await?
            }
            Ok(None) => {}
            Err(e) => report.collection_issue(code, format!("unreadable metadata.json: {e}")),
        }
    }

    match storage.load_manifest().await {
        Ok(Some(manifest)) => {
            if let Err(e) = manifest.validate() {
                report.manifest_issue(e.to_string());
            }
            for entry in &manifest.exams {
                match counts.get(&entry.code) {
                    None => report.manifest_issue(format!("{} is listed but not stored", entry.code)),
                    Some(&count) if count != entry.question_count => report.manifest_issue(format!(
                        "{} lists {} questions, collection holds {}",
                        entry.code, entry.question_count, count
                    )),
                    Some(_) => {}
                }
            }
            for (code, &count) in &counts {
                if count > 0 && !manifest.exams.iter().any(|e| &e.code == code) {
                    report.manifest_issue(format!("{code} is stored but not listed"));
                }
            }
        }
        Ok(None) => {}
        Err(e) => report.manifest_issue(format!("unreadable manifest.json: {e}")),
    }

    report.issues.sort_by(|a, b| a.code.cmp(&b.code).then(a.message.cmp(&b.message)));
    Ok(report)
}

async fn check_chunks(
    storage: &dyn CollectionStorage,
    code: &str,
    metadata: &ChunkMetadata,
    records: usize,
    report: &mut StoreReport,
) -> Result<()> {
    let expected = ChunkMetadata::expected_chunks(metadata.total_questions, metadata.chunk_size);
    if metadata.total_chunks != expected {
        report.collection_issue(
            code,
            format!(
                "metadata lists {} chunks, {} questions in chunks of {} need {}",
                metadata.total_chunks, metadata.total_questions, metadata.chunk_size, expected
            ),
        );
    }
    if metadata.total_questions != records {
        report.collection_issue(
            code,
            format!(
                "metadata lists {} questions, collection holds {}",
                metadata.total_questions, records
            ),
        );
    }
    let missing = metadata.missing_chunks();
    if !missing.is_empty() {
        report.collection_issue(code, format!("chunks {missing:?} were never created"));
    }

    let on_disk = storage.chunk_indices(code).await?;
    for index in (0..metadata.total_chunks).filter(|i| !on_disk.contains(i)) {
        report.collection_issue(code, format!("chunk file {index} is missing"));
    }
    Ok(())
}
