// src/pipeline/manifest.rs

//! Regenerates the top-level manifest from the stored collections.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Manifest, ManifestEntry};
use crate::storage::CollectionStorage;

pub struct ManifestBuilder {
    storage: Arc<dyn CollectionStorage>,
}

impl ManifestBuilder {
    pub fn new(storage: Arc<dyn CollectionStorage>) -> Self {
        Self { storage }
    }

    /// Rebuild the manifest from every readable, non-empty collection and
    /// write it, keeping the previous one as a backup.
    pub async fn build(&self) -> Result<Manifest> {
        let mut entries = Vec::new();
        for code in self.storage.list_collections().await? {
            let collection = match self.storage.load_collection(&code).await {
                Ok(Some(collection)) => collection,
                Ok(None) => {
                    log::warn!("Skipping {}: no collection file", code);
                    continue;
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", code, e);
                    continue;
                }
            };
            if collection.is_empty() {
                log::warn!("Skipping {}: no questions", code);
                continue;
            }

            let last_updated = self
                .storage
                .collection_modified(&code)
                .await?
                .unwrap_or_else(Utc::now);
            entries.push(ManifestEntry::new(code, collection.len(), last_updated));
        }

        let manifest = Manifest::from_entries(entries, Utc::now());
        self.storage.save_manifest(&manifest).await?;
        log::info!(
            "Manifest updated: {} exams, {} questions",
            manifest.total_exams,
            manifest.total_questions
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Collection, Record, RecordId};
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn collection(n: u64) -> Collection {
        Collection::from_records(
            (1..=n).map(|i| Record::new(RecordId::new(i), format!("https://example.com/question-{i}"))),
        )
    }

    #[tokio::test]
    async fn test_build_sums_and_skips_bad_collections() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        storage.save_collection("SAA-C03", &collection(7)).await.unwrap();
        storage.save_collection("AZ-900", &collection(5)).await.unwrap();
        storage.save_collection("EMPTY-1", &Collection::new()).await.unwrap();
        std::fs::create_dir_all(tmp.path().join("BROKEN-1")).unwrap();
        std::fs::write(tmp.path().join("BROKEN-1/exam.json"), "not json").unwrap();

        let manifest = ManifestBuilder::new(storage.clone()).build().await.unwrap();

        let codes: Vec<&str> = manifest.exams.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["AZ-900", "SAA-C03"]);
        assert_eq!(manifest.total_exams, 2);
        assert_eq!(manifest.total_questions, 12);
        assert!(manifest.validate().is_ok());
        assert_eq!(storage.load_manifest().await.unwrap(), Some(manifest));
    }

    #[tokio::test]
    async fn test_rebuild_backs_up_previous_manifest() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        storage.save_collection("AZ-900", &collection(5)).await.unwrap();
        let builder = ManifestBuilder::new(storage.clone());

        builder.build().await.unwrap();
        storage.save_collection("AZ-900", &collection(6)).await.unwrap();
        let manifest = builder.build().await.unwrap();

        assert_eq!(manifest.total_questions, 6);
        let backup: Manifest = serde_json::from_slice(
            &std::fs::read(tmp.path().join("manifest.json.backup")).unwrap(),
        )
        .unwrap();
        assert_eq!(backup.total_questions, 5);
    }

    #[tokio::test]
    async fn test_last_updated_is_collection_file_mtime() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        storage.save_collection("AZ-900", &collection(3)).await.unwrap();

        let mtime = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        std::fs::File::options()
            .write(true)
            .open(tmp.path().join("AZ-900/exam.json"))
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        let manifest = ManifestBuilder::new(storage).build().await.unwrap();
        assert_eq!(
            manifest.exams[0].last_updated,
            chrono::DateTime::<Utc>::from(mtime)
        );
    }
}
