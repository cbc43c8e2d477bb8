// src/pipeline/sync.rs

//! Crawl, fetch, detect and merge loop for one collection.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::cancel::CancelFlag;
use crate::error::{AppError, Result};
use crate::logging::{LogProgress, ProgressEvent, ProgressSink};
use crate::models::{Collection, Config, Fetched, RecordId, SyncConfig, SyncStatus};
use crate::pipeline::diff::{Change, ChangeDetector};
use crate::services::{
    HtmlPageParser, HttpSource, ImageProcessor, LinkCrawler, PageParser, PageSource,
    RecordFetcher, SkipImages,
};
use crate::storage::CollectionStorage;

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Skip the pacing delay between records
    pub fast_mode: bool,
    /// Discard stored links and rediscover from page 1
    pub force_rescan: bool,
    /// Replace every stored record regardless of change detection
    pub force_update: bool,
}

/// Counters for one sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub discovered: usize,
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Exactly the discovered records are stored
    Complete,
    /// The run stopped early; stored records were kept
    CompleteWithErrors { error: String, records: usize },
    /// The run stopped before any record was stored
    Failed { error: String },
}

impl SyncOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Complete => None,
            Self::CompleteWithErrors { error, .. } | Self::Failed { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub collection: Collection,
    pub outcome: SyncOutcome,
    pub stats: SyncStats,
}

/// Capabilities a sync runs against.
pub struct Collaborators {
    pub source: Arc<dyn PageSource>,
    pub parser: Arc<dyn PageParser>,
    pub images: Arc<dyn ImageProcessor>,
    pub storage: Arc<dyn CollectionStorage>,
    pub progress: Arc<dyn ProgressSink>,
}

impl Collaborators {
    /// HTTP source, HTML parser, no image processing and log progress.
    pub fn from_config(config: &Config, storage: Arc<dyn CollectionStorage>) -> Result<Self> {
        Ok(Self {
            source: Arc::new(HttpSource::new(&config.crawler)?),
            parser: Arc::new(HtmlPageParser::new(config.selectors.clone())?),
            images: Arc::new(SkipImages),
            storage,
            progress: Arc::new(LogProgress),
        })
    }
}

/// Synchronizes one collection at a time.
pub struct SyncOrchestrator {
    crawler: LinkCrawler,
    fetcher: RecordFetcher,
    detector: ChangeDetector,
    storage: Arc<dyn CollectionStorage>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
    pacing: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(config: &Config, parts: Collaborators, cancel: CancelFlag) -> Self {
        let base_url = config.crawler.base_url.clone();
        Self {
            crawler: LinkCrawler::new(
                Arc::clone(&parts.source),
                Arc::clone(&parts.parser),
                Arc::clone(&parts.storage),
                Arc::clone(&parts.progress),
                cancel.clone(),
                base_url.clone(),
            ),
            fetcher: RecordFetcher::new(parts.source, parts.parser, parts.images, base_url),
            detector: ChangeDetector::new(),
            storage: parts.storage,
            progress: parts.progress,
            cancel,
            pacing: config.sync.clone(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn CollectionStorage> {
        &self.storage
    }

    pub fn crawler(&self) -> &LinkCrawler {
        &self.crawler
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Synchronize one collection.
    ///
    /// Discovery errors and an unreadable collection file are returned as
    /// errors. A record failure or cancellation stops the loop; records
    /// merged so far are persisted and reported as `CompleteWithErrors`.
    /// The collection file is saved every `save_every` written records and
    /// once more when the loop ends.
    pub async fn sync(&self, code: &str, options: SyncOptions) -> Result<SyncReport> {
        let links = self.crawler.discover(code, options.force_rescan).await?;
        let ids: Vec<RecordId> = links.ids();
        if ids.is_empty() {
            return Err(AppError::NoRecordsFound(code.to_string()));
        }

        let mut collection = self.storage.load_collection(code).await?.unwrap_or_default();
        let mut stats = SyncStats {
            discovered: ids.len(),
            ..SyncStats::default()
        };
        log::info!(
            "Syncing {}: {} questions discovered, {} stored",
            code,
            ids.len(),
            collection.len()
        );

        let total = links.links.len();
        let mut error: Option<String> = None;
        let mut unsaved = 0;
        for (position, link) in links.links.iter().enumerate() {
            if self.cancel.is_cancelled() {
                error = Some("sync cancelled".to_string());
                break;
            }

            let record = match self.fetcher.fetch(link).await {
                Fetched::Record(record) => record,
                Fetched::Failed { link, reason } => {
                    stats.failed += 1;
                    log::error!("Failed to fetch {}: {}", link, reason);
                    error = Some(format!("Failed to fetch {link}: {reason}"));
                    break;
                }
            };
            stats.fetched += 1;

            let id = record.id;
            let change = self.detector.classify(collection.get(id), &record);
            match &change {
                Change::New => stats.new += 1,
                Change::Updated(reason) => {
                    stats.updated += 1;
                    log::info!("Question {} updated: {}", id, reason);
                }
                Change::Unchanged => stats.unchanged += 1,
            }

            if change.is_write() || options.force_update {
                collection.upsert(record);
                collection.status = SyncStatus::InProgress;
                unsaved += 1;
                if unsaved >= self.pacing.save_every {
                    self.storage.save_collection(code, &collection).await?;
                    unsaved = 0;
                }
            }

            self.progress.report(ProgressEvent::RecordProcessed {
                position: position + 1,
                total,
                id,
                change: change.to_string(),
            });

            if !options.fast_mode && position + 1 < total {
                tokio::time::sleep(pacing_delay(&self.pacing)).await;
            }
        }

        collection.sort_by_id();
        if error.is_none() && collection.len() != ids.len() {
            let missing = ids.iter().filter(|id| !collection.contains(**id)).count();
            error = Some(format!(
                "{} questions stored for {} discovered links ({} missing)",
                collection.len(),
                ids.len(),
                missing
            ));
        }
        collection.status = if error.is_none() {
            SyncStatus::Complete
        } else {
            SyncStatus::InProgress
        };
        collection.error = error.clone().unwrap_or_default();
        self.storage.save_collection(code, &collection).await?;

        let outcome = if collection.is_empty() {
            SyncOutcome::Failed {
                error: error.unwrap_or_else(|| "no questions stored".to_string()),
            }
        } else if let Some(error) = error {
            SyncOutcome::CompleteWithErrors {
                error,
                records: collection.len(),
            }
        } else {
            SyncOutcome::Complete
        };

        self.progress.report(ProgressEvent::Finished {
            code: code.to_string(),
            records: collection.len(),
            outcome: match &outcome {
                SyncOutcome::Complete => "complete".to_string(),
                SyncOutcome::CompleteWithErrors { .. } => "stopped early".to_string(),
                SyncOutcome::Failed { .. } => "failed".to_string(),
            },
        });
        log::info!(
            "{}: {} new, {} updated, {} unchanged, {} failed",
            code,
            stats.new,
            stats.updated,
            stats.unchanged,
            stats.failed
        );

        Ok(SyncReport {
            collection,
            outcome,
            stats,
        })
    }
}

/// Uniform random delay within the configured window.
fn pacing_delay(pacing: &SyncConfig) -> Duration {
    let low = pacing.delay_min_ms.min(pacing.delay_max_ms);
    let high = pacing.delay_max_ms.max(low);
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}
