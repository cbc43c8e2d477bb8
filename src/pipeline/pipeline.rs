// src/pipeline/pipeline.rs

use std::sync::Arc;

use crate::error::Result;
use crate::logging;
use crate::models::{BatchSummary, Config, Manifest};

use super::batch::update_all;
use super::chunk::{ChunkPartitioner, PartitionResult};
use super::manifest::ManifestBuilder;
use super::sync::{SyncOptions, SyncOrchestrator};

/// What a full pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub summary: BatchSummary,
    pub chunked: Vec<(String, PartitionResult)>,
    pub manifest: Manifest,
}

/// Run the full pipeline: update, re-chunk, then rebuild the manifest.
///
/// Chunking and the manifest run even when some collections failed to
/// update, so they reflect whatever is stored.
pub async fn run_pipeline(
    orchestrator: &SyncOrchestrator,
    config: &Config,
    options: SyncOptions,
    only: Option<&str>,
) -> Result<PipelineReport> {
    let storage = Arc::clone(orchestrator.storage());

    logging::step(1, 3, "Update - Syncing stored exams");
    let summary = update_all(
        orchestrator,
        config.sync.inter_collection_pause(),
        options,
        only,
    )
    .await?;

    logging::step(2, 3, "Chunk - Partitioning large exams");
    let chunked = ChunkPartitioner::new(Arc::clone(&storage))
        .chunk_all(config.chunking.chunk_size, config.chunking.min_records)
        .await?;

    logging::step(3, 3, "Manifest - Rebuilding the exam index");
    let manifest = ManifestBuilder::new(storage).build().await?;

    Ok(PipelineReport {
        summary,
        chunked,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cancel::CancelFlag;
    use crate::logging::LogProgress;
    use crate::models::Collection;
    use crate::pipeline::Collaborators;
    use crate::services::SkipImages;
    use crate::storage::{CollectionStorage, LocalStorage};
    use crate::testing::{JsonParser, exam_site};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pipeline_updates_chunks_and_indexes() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        storage.save_collection("AZ-900", &Collection::new()).await.unwrap();
        storage.save_collection("AZ-104", &Collection::new()).await.unwrap();

        let mut config = Config::default();
        config.sync.delay_min_ms = 0;
        config.sync.delay_max_ms = 0;
        config.sync.inter_collection_pause_secs = 0;
        config.chunking.chunk_size = 2;
        config.chunking.min_records = 3;

        let big: Vec<u64> = (1..=5).collect();
        let parts = Collaborators {
            source: Arc::new(exam_site(&[("AZ-900", &big), ("AZ-104", &[1, 2])])),
            parser: Arc::new(JsonParser),
            images: Arc::new(SkipImages),
            storage: storage.clone(),
            progress: Arc::new(LogProgress),
        };
        let orchestrator = SyncOrchestrator::new(&config, parts, CancelFlag::new());

        let report = run_pipeline(&orchestrator, &config, SyncOptions::default(), None)
            .await
            .unwrap();

        assert_eq!(report.summary.successful, 2);
        assert_eq!(report.chunked.len(), 1);
        assert_eq!(report.chunked[0].0, "AZ-900");
        assert_eq!(report.manifest.total_questions, 7);
        let meta = storage.load_chunk_metadata("AZ-900").await.unwrap().unwrap();
        assert_eq!(meta.total_chunks, 3);
    }
}
