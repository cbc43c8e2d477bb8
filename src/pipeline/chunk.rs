// src/pipeline/chunk.rs

//! Fixed-size, order-stable partitioning of collections into chunk files.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Chunk, ChunkMetadata, Record};
use crate::storage::CollectionStorage;

/// Result of partitioning one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionResult {
    Chunked(ChunkMetadata),
    /// The collection fits in a single chunk
    Skipped { records: usize },
}

/// Writes chunk files and their metadata.
pub struct ChunkPartitioner {
    storage: Arc<dyn CollectionStorage>,
}

impl ChunkPartitioner {
    pub fn new(storage: Arc<dyn CollectionStorage>) -> Self {
        Self { storage }
    }

    /// Split `records` into chunks of at most `chunk_size`, in the given order.
    ///
    /// When the records fit in one chunk, chunks left by an earlier partition
    /// are removed.
    ///
    /// A chunk that fails to write is left out of `created_chunks`; the
    /// remaining chunks are still attempted.
    pub async fn partition(
        &self,
        code: &str,
        records: &[Record],
        chunk_size: usize,
    ) -> Result<PartitionResult> {
        if chunk_size == 0 {
            return Err(AppError::validation("chunk size must be > 0"));
        }
        if records.len() <= chunk_size {
            log::info!(
                "{} has {} questions, no chunking needed (chunk size {})",
                code,
                records.len(),
                chunk_size
            );
            if self.storage.remove_chunks(code).await? {
                log::info!("Removed chunks of an earlier partition for {}", code);
            }
            return Ok(PartitionResult::Skipped {
                records: records.len(),
            });
        }

        let total_chunks = ChunkMetadata::expected_chunks(records.len(), chunk_size);
        let mut created_chunks = BTreeSet::new();

        for (index, slice) in records.chunks(chunk_size).enumerate() {
            let start_ordinal = index * chunk_size + 1;
            let chunk = Chunk {
                index,
                start_ordinal,
                end_ordinal: start_ordinal + slice.len() - 1,
                count: slice.len(),
                questions: Cow::Borrowed(slice),
            };
            match self.storage.write_chunk(code, &chunk).await {
                Ok(()) => {
                    log::debug!(
                        "{} chunk {}: questions {}-{}",
                        code,
                        index,
                        chunk.start_ordinal,
                        chunk.end_ordinal
                    );
                    created_chunks.insert(index);
                }
                Err(e) => log::error!("Failed to write {} chunk {}: {}", code, index, e),
            }
        }

        for stale in self
            .storage
            .chunk_indices(code)
            .await?
            .into_iter()
            .filter(|&i| i >= total_chunks)
        {
            match self.storage.remove_chunk(code, stale).await {
                Ok(()) => log::info!("Removed stale {} chunk {}", code, stale),
                Err(e) => log::warn!("Failed to remove stale {} chunk {}: {}", code, stale, e),
            }
        }

        let metadata = ChunkMetadata {
            exam_code: code.to_string(),
            exam_name: code.to_string(),
            chunked: true,
            chunk_size,
            total_chunks,
            total_questions: records.len(),
            created_chunks,
            created_at: Utc::now().date_naive(),
        };
        self.storage.save_chunk_metadata(code, &metadata).await?;

        if metadata.is_complete() {
            log::info!("{}: {} questions in {} chunks", code, records.len(), total_chunks);
        } else {
            log::warn!(
                "{}: chunks {:?} were not written",
                code,
                metadata.missing_chunks()
            );
        }
        Ok(PartitionResult::Chunked(metadata))
    }

    /// Partition every collection holding at least `min_records` records.
    pub async fn chunk_all(
        &self,
        chunk_size: usize,
        min_records: usize,
    ) -> Result<Vec<(String, PartitionResult)>> {
        let mut results = Vec::new();
        for code in self.storage.list_collections().await? {
            let collection = match self.storage.load_collection(&code).await {
                Ok(Some(collection)) => collection,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Skipping {}: {}", code, e);
                    continue;
                }
            };
            if collection.len() < min_records {
                log::info!(
                    "Skipping {}: {} questions (minimum {})",
                    code,
                    collection.len(),
                    min_records
                );
                continue;
            }
            let result = self
                .partition(&code, collection.records(), chunk_size)
                .await?;
            results.push((code, result));
        }
        Ok(results)
    }

    /// Remove the chunk files and metadata of one collection.
    pub async fn cleanup_chunks(&self, code: &str) -> Result<bool> {
        let removed = self.storage.remove_chunks(code).await?;
        if removed {
            log::info!("Removed chunks for {}", code);
        } else {
            log::info!("No chunks to remove for {}", code);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Collection, RecordId};
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn records(n: u64) -> Vec<Record> {
        (1..=n)
            .map(|i| Record::new(RecordId::new(i), format!("https://example.com/question-{i}")))
            .collect()
    }

    fn setup() -> (TempDir, Arc<LocalStorage>, ChunkPartitioner) {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        let partitioner = ChunkPartitioner::new(storage.clone());
        (tmp, storage, partitioner)
    }

    #[tokio::test]
    async fn test_120_records_in_chunks_of_50() {
        let (_tmp, storage, partitioner) = setup();
        let records = records(120);

        let PartitionResult::Chunked(meta) =
            partitioner.partition("AZ-900", &records, 50).await.unwrap()
        else {
            panic!("expected chunking");
        };

        assert_eq!(meta.total_chunks, 3);
        assert_eq!(meta.total_questions, 120);
        assert_eq!(meta.created_chunks.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);

        let mut rebuilt = Vec::new();
        let mut sizes = Vec::new();
        for index in 0..3 {
            let chunk = storage.load_chunk("AZ-900", index).await.unwrap().unwrap();
            sizes.push(chunk.count);
            assert_eq!(chunk.start_ordinal, index * 50 + 1);
            rebuilt.extend(chunk.questions.into_owned());
        }
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(rebuilt, records);
        assert_eq!(storage.load_chunk_metadata("AZ-900").await.unwrap(), Some(meta));
    }

    #[tokio::test]
    async fn test_small_collection_is_skipped() {
        let (_tmp, storage, partitioner) = setup();
        let result = partitioner.partition("AZ-900", &records(50), 50).await.unwrap();
        assert_eq!(result, PartitionResult::Skipped { records: 50 });
        assert!(storage.load_chunk_metadata("AZ-900").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skipping_removes_earlier_partition() {
        let (_tmp, storage, partitioner) = setup();
        let mut records = records(150);
        partitioner.partition("AZ-900", &records, 50).await.unwrap();

        records[0].body = "edited".into();
        let result = partitioner.partition("AZ-900", &records, 200).await.unwrap();

        assert_eq!(result, PartitionResult::Skipped { records: 150 });
        assert!(storage.load_chunk_metadata("AZ-900").await.unwrap().is_none());
        assert!(storage.chunk_indices("AZ-900").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_chunks_removed_after_shrink() {
        let (_tmp, storage, partitioner) = setup();
        partitioner.partition("AZ-900", &records(150), 50).await.unwrap();
        assert_eq!(storage.chunk_indices("AZ-900").await.unwrap(), vec![0, 1, 2]);

        partitioner.partition("AZ-900", &records(60), 50).await.unwrap();
        assert_eq!(storage.chunk_indices("AZ-900").await.unwrap(), vec![0, 1]);
        let meta = storage.load_chunk_metadata("AZ-900").await.unwrap().unwrap();
        assert_eq!(meta.total_chunks, 2);
    }

    #[tokio::test]
    async fn test_failed_chunk_is_not_marked_created() {
        let (tmp, storage, partitioner) = setup();
        // A directory in place of chunk_1.json makes that write fail.
        std::fs::create_dir_all(tmp.path().join("AZ-900/chunks/chunk_1.json/blocker")).unwrap();

        let PartitionResult::Chunked(meta) =
            partitioner.partition("AZ-900", &records(120), 50).await.unwrap()
        else {
            panic!("expected chunking");
        };

        assert_eq!(meta.created_chunks.iter().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert!(!meta.is_complete());
        assert!(storage.load_chunk("AZ-900", 2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_chunk_all_respects_minimum_and_cleanup() {
        let (_tmp, storage, partitioner) = setup();
        storage
            .save_collection("BIG-1", &Collection::from_records(records(120)))
            .await
            .unwrap();
        storage
            .save_collection("SMALL-1", &Collection::from_records(records(80)))
            .await
            .unwrap();

        let results = partitioner.chunk_all(50, 100).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "BIG-1");

        assert!(partitioner.cleanup_chunks("BIG-1").await.unwrap());
        assert!(storage.load_chunk_metadata("BIG-1").await.unwrap().is_none());
        assert!(!partitioner.cleanup_chunks("SMALL-1").await.unwrap());
    }
}
